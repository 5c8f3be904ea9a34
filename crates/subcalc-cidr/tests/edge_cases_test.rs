use serde_json::Value;
use subcalc_cidr::report::{calculate, describe_address};
use subcalc_cidr::{derive, summarize, Address, HostCount, IpVersion, Network};

fn calc(address: &str, spec: &str) -> Value {
    let value = serde_json::to_value(calculate(address, spec, false)).expect("serialize");
    assert!(value.get("error").is_none(), "unexpected error: {}", value);
    value
}

#[test]
fn test_ipv4_31_hosts_are_usable() {
    let result = calc("192.168.1.10", "31");
    assert_eq!(result["Network Address"], "192.168.1.10");
    assert_eq!(result["Broadcast Address"], "192.168.1.11");
    assert_eq!(result["HostMin"], "192.168.1.10");
    assert_eq!(result["HostMax"], "192.168.1.11");
    assert_eq!(result["Total Hosts"], 2);
}

#[test]
fn test_ipv4_32_single_host() {
    let result = calc("10.0.0.5", "32");
    assert_eq!(result["Network Address"], "10.0.0.5");
    assert_eq!(result["Broadcast Address"], "10.0.0.5");
    assert_eq!(result["HostMin"], "10.0.0.5");
    assert_eq!(result["HostMax"], "10.0.0.5");
    assert_eq!(result["Total Hosts"], 1);
    assert_eq!(result["Wildcard"], "0.0.0.0");
}

#[test]
fn test_ipv6_127_usable_pair() {
    let result = calc("2001:db8::1", "127");
    assert_eq!(result["Network Address"], "2001:db8::");
    assert_eq!(result["Broadcast Address"], "2001:db8::1");
    assert_eq!(result["HostMin"], "2001:db8::");
    assert_eq!(result["HostMax"], "2001:db8::1");
    assert_eq!(result["Total Hosts"], 2);
}

#[test]
fn test_ipv6_128_single_address() {
    let result = calc("2001:db8::1", "128");
    assert_eq!(result["Network Address"], "2001:db8::1");
    assert_eq!(result["Broadcast Address"], "2001:db8::1");
    assert_eq!(result["HostMin"], "2001:db8::1");
    assert_eq!(result["HostMax"], "2001:db8::1");
    assert_eq!(result["Total Hosts"], 1);
}

#[test]
fn test_cidr_boundaries() {
    assert_eq!(calc("8.8.8.8", "0")["CIDR"], 0);
    assert_eq!(calc("1.1.1.1", "32")["CIDR"], 32);
    assert_eq!(calc("2001:db8::1", "128")["CIDR"], 128);
}

#[test]
fn test_wide_ipv6_counts_are_strings() {
    let result = calc("2001:db8::", "64");
    assert_eq!(result["Total Hosts"], "18446744073709551616");

    let result = calc("::", "0");
    assert_eq!(result["Total Hosts"], "340282366920938463463374607431768211456");
}

#[test]
fn test_malformed_inputs() {
    let report = calculate("192.168.1.1!", "24", false);
    assert!(report.error().unwrap().contains("contains invalid characters"));

    let report = calculate("192.168.1.1", "300.0.0.0", false);
    assert!(report.error().unwrap().contains("octets between 0 and 255"));

    let report = calculate("192.168.1.1", "33", false);
    assert!(report.is_error());

    let report = calculate("192.168.1.1", "255.255.0.255", false);
    assert!(report.error().unwrap().contains("contiguous"));
}

#[test]
fn test_ipv4_host_formula_every_prefix() {
    let address = Address::parse("198.51.100.200").unwrap();
    for prefix_len in 0..=30u8 {
        let net = Network::new(address, prefix_len).unwrap();
        let details = derive(&net);
        assert_eq!(details.host_min.to_bits(), details.network.first() + 1);
        assert_eq!(details.host_max.to_bits(), details.broadcast.to_bits() - 1);
        assert_eq!(
            details.total_hosts,
            HostCount::Finite((1u128 << (32 - prefix_len)) - 2)
        );
    }
}

#[test]
fn test_netmask_strings_round_trip() {
    for prefix_len in 0..=32u8 {
        let net = Network::new(Address::parse("0.0.0.0").unwrap(), prefix_len).unwrap();
        let mask = net.netmask().to_string();
        let value = calc("10.0.0.1", &mask);
        assert_eq!(value["Netmask"], mask.as_str());
        assert_eq!(value["CIDR"], prefix_len);
    }
}

#[test]
fn test_accepted_netmask_text_is_reproduced() {
    // a netmask is only accepted in the form it will be reported back in
    for spec in ["255.255.255.000", "255.255.255.00", "255.255.000.0", "255.0255.0.0"] {
        let report = calculate("10.0.0.1", spec, false);
        assert!(
            report.error().unwrap().contains("octets between 0 and 255"),
            "{} was accepted",
            spec
        );
    }

    let value = calc("10.0.0.1", "255.255.255.0");
    assert_eq!(value["Netmask"], "255.255.255.0");
}

#[test]
fn test_prefix_length_digit_limits() {
    assert!(calculate("10.0.0.1", "0024", false).is_error());
    assert!(calculate("10.0.0.1", "024", false).is_error());
    assert_eq!(calc("10.0.0.1", "24")["CIDR"], 24);
    assert_eq!(calc("2001:db8::1", "064")["CIDR"], 64);
    assert!(calculate("2001:db8::1", "0064", false).is_error());
}

#[test]
fn test_summary_exactly_covers_network() {
    for cidr in ["10.20.0.0/14", "192.168.7.64/26", "2001:db8:abcd::/48"] {
        let net = Network::parse(cidr).unwrap();
        let blocks = summarize(net.first(), net.last(), net.version()).unwrap();
        assert_eq!(blocks, vec![net]);
    }
}

#[test]
fn test_summary_of_arbitrary_range_is_exact() {
    let first = Address::parse("2001:db8::3").unwrap().to_bits();
    let last = Address::parse("2001:db8::1:4").unwrap().to_bits();
    let blocks = summarize(first, last, IpVersion::V6).unwrap();

    let mut cursor = first;
    for block in &blocks {
        assert_eq!(block.first(), cursor);
        cursor = block.last() + 1;
    }
    assert_eq!(cursor, last + 1);
}

#[test]
fn test_idempotent_output() {
    for (address, spec) in [("10.1.2.3", "20"), ("2001:db8::9", "ffff:ffff::"), ("1.2.3.4", "0.0.0.255")] {
        let first = serde_json::to_string(&calculate(address, spec, true)).unwrap();
        let second = serde_json::to_string(&calculate(address, spec, true)).unwrap();
        assert_eq!(first, second);
    }
}

#[test]
fn test_address_query() {
    let value = serde_json::to_value(describe_address("192.168.1.10")).unwrap();
    assert_eq!(value["Version"], 4);
    assert_eq!(value["Is Private"], true);
    assert_eq!(value["Reverse Pointer"], "10.1.168.192.in-addr.arpa");
    assert_eq!(value["Hexadecimal"], "c0a8010a");
}
