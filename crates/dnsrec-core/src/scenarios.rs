//! Record lifecycle scenarios
//!
//! Each scenario declares one zone and one record inside it, then checks the
//! record exists, carries the declared data verbatim, and that the run state
//! attributes match the declaration.

use crate::driver::{Check, TestCase, TestStep};
use crate::resource::{AttrValue, Configuration, RecordBlock, ResourceAddress};

/// Default zone the scenarios are run against
pub const ZONE: &str = "foobar-test-terraform.com";

/// IP address the zone is created with
pub const ZONE_IP: &str = "192.168.0.10";

const RESOURCE_NAME: &str = "foobar";
const RECORD_NAME: &str = "terraform";

fn record_address() -> ResourceAddress {
    ResourceAddress::record(RESOURCE_NAME)
}

fn domain_address() -> ResourceAddress {
    ResourceAddress::domain(RESOURCE_NAME)
}

/// Zone plus one record whose `domain` refers to the zone's name
fn config(zone: &str, record_type: &str, value: &str) -> Configuration {
    let domain_ref = AttrValue::Reference {
        address: domain_address(),
        attribute: "name".to_string(),
    };

    Configuration::new()
        .with_domain(domain_address(), zone, ZONE_IP)
        .with_record(
            record_address(),
            RecordBlock::new(domain_ref, RECORD_NAME, value, record_type),
        )
}

fn verified_step(zone: &str, record_type: &str, value: &str) -> TestStep {
    let address = record_address();
    TestStep::new(config(zone, record_type, value))
        .check(Check::exists(address.clone()))
        .check(Check::data(address.clone(), value))
        .check(Check::attr(address.clone(), "name", RECORD_NAME))
        .check(Check::attr(address.clone(), "domain", zone))
        .check(Check::attr(address.clone(), "value", value))
        .check(Check::attr(address, "type", record_type))
}

/// A record pointing at the zone's own address
pub fn basic(zone: &str) -> TestCase {
    TestCase::new("basic").step(verified_step(zone, "A", "192.168.0.10"))
}

/// An A record whose value changes in place between two steps
pub fn updated(zone: &str) -> TestCase {
    TestCase::new("updated")
        .step(verified_step(zone, "A", "192.168.0.10"))
        .step(verified_step(zone, "A", "192.168.0.11"))
}

/// CNAME to an absolute hostname inside the zone
pub fn hostname_value(zone: &str) -> TestCase {
    let target = format!("a.{}.", zone);
    TestCase::new("hostname_value").step(verified_step(zone, "CNAME", &target))
}

/// CNAME to a relative hostname
pub fn relative_hostname_value(zone: &str) -> TestCase {
    TestCase::new("relative_hostname_value").step(verified_step(zone, "CNAME", "a.b"))
}

/// CNAME to an absolute hostname outside the zone
pub fn external_hostname_value(zone: &str) -> TestCase {
    let external = match zone.rsplit_once('.') {
        Some((stem, _)) => format!("a.{}.net.", stem),
        None => format!("a.{}.net.", zone),
    };
    TestCase::new("external_hostname_value").step(verified_step(zone, "CNAME", &external))
}

/// Every scenario, in a stable order
pub fn all(zone: &str) -> Vec<TestCase> {
    vec![
        basic(zone),
        updated(zone),
        hostname_value(zone),
        relative_hostname_value(zone),
        external_hostname_value(zone),
    ]
}

/// Look a scenario up by name
pub fn by_name(name: &str, zone: &str) -> Option<TestCase> {
    all(zone).into_iter().find(|case| case.name == name)
}
