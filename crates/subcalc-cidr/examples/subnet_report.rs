//! Subnet report example
//!
//! Run with: cargo run -p subcalc-cidr --example subnet_report

use subcalc_cidr::pattern::{cidr_list, ipv4_regex};
use subcalc_cidr::summarize::summarize_addresses;
use subcalc_cidr::{derive, Address, Network};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("subcalc - Subnet Report Example\n");

    let network = Network::resolve("172.30.151.250", "255.255.255.224")?;
    let details = derive(&network);

    println!("Network: {}", network);
    println!("─────────────────────────────");
    println!("Netmask:       {}", details.netmask);
    println!("Wildcard:      {}", details.wildcard);
    println!("Broadcast:     {}", details.broadcast);
    println!("HostMin:       {}", details.host_min);
    println!("HostMax:       {}", details.host_max);
    println!("Total Hosts:   {}", details.total_hosts);

    let first = Address::parse("10.0.0.5")?;
    let last = Address::parse("10.0.1.20")?;
    let blocks = summarize_addresses(&first, &last)?;

    println!("\nSummary of {} - {}:", first, last);
    for block in cidr_list(&blocks) {
        println!("  {}", block);
    }
    if let Some(regex) = ipv4_regex(&blocks) {
        println!("\nRegex: {}", regex);
    }

    Ok(())
}
