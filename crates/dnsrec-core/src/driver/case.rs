//! Test cases, steps and checks

use std::fmt;

use crate::resource::{Configuration, ResourceAddress};

/// A check run after a step has been applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Check {
    /// The record exists remotely under the id run state holds
    ///
    /// The fetched record is captured for later `RecordData` checks in the
    /// same step.
    RecordExists(ResourceAddress),

    /// The record captured by `RecordExists` carries the expected data
    RecordData {
        address: ResourceAddress,
        expected: String,
    },

    /// A run state attribute has the expected value
    ResourceAttr {
        address: ResourceAddress,
        key: String,
        expected: String,
    },
}

impl Check {
    pub fn exists(address: ResourceAddress) -> Self {
        Check::RecordExists(address)
    }

    pub fn data(address: ResourceAddress, expected: impl Into<String>) -> Self {
        Check::RecordData {
            address,
            expected: expected.into(),
        }
    }

    pub fn attr(
        address: ResourceAddress,
        key: impl Into<String>,
        expected: impl Into<String>,
    ) -> Self {
        Check::ResourceAttr {
            address,
            key: key.into(),
            expected: expected.into(),
        }
    }

    pub fn address(&self) -> &ResourceAddress {
        match self {
            Check::RecordExists(address) => address,
            Check::RecordData { address, .. } => address,
            Check::ResourceAttr { address, .. } => address,
        }
    }
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Check::RecordExists(address) => write!(f, "{} exists", address),
            Check::RecordData { address, expected } => {
                write!(f, "{} data == {}", address, expected)
            }
            Check::ResourceAttr {
                address,
                key,
                expected,
            } => write!(f, "{}.{} == {}", address, key, expected),
        }
    }
}

/// One configuration to apply and the checks that must pass afterwards
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestStep {
    pub config: Configuration,
    pub checks: Vec<Check>,
}

impl TestStep {
    pub fn new(config: Configuration) -> Self {
        Self {
            config,
            checks: Vec::new(),
        }
    }

    pub fn check(mut self, check: Check) -> Self {
        self.checks.push(check);
        self
    }
}

/// An ordered sequence of steps making up one lifecycle run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCase {
    pub name: String,
    pub steps: Vec<TestStep>,
}

impl TestCase {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
        }
    }

    pub fn step(mut self, step: TestStep) -> Self {
        self.steps.push(step);
        self
    }
}
