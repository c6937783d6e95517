use clap::Parser;
use ipaddress::Ipv4Address;
use log::debug;
use std::fmt::Write;
use std::process;

#[derive(Parser)]
#[command(
    name = "ipcalc",
    version,
    about = "Print network, broadcast and range of an IPv4 address"
)]
struct Opts {
    /// Address as a.b.c.d or a.b.c.d/prefix
    address: String,

    /// Also print the address bits, reverse DNS name and block size
    #[arg(short = 'x', long)]
    extended: bool,
}

fn report(ipv4: &Ipv4Address, extended: bool) -> Result<String, std::fmt::Error> {
    let mut out = String::new();
    writeln!(out, "Address = {}", ipv4)?;
    writeln!(out, "CIDR = {}/{}", ipv4, ipv4.prefix())?;
    writeln!(out, "Netmask = {}", ipv4.netmask())?;
    writeln!(out, "Network = {}", ipv4.network())?;
    writeln!(out, "Broadcast = {}", ipv4.broadcast())?;
    match (ipv4.network().next(), ipv4.broadcast().prev()) {
        (Some(first), Some(last)) => writeln!(out, "Range = {} to {}", first, last)?,
        _ => writeln!(out, "Range = n/a")?,
    }
    let class = ipv4.class().map(|c| c.to_string()).unwrap_or_default();
    writeln!(out, "Class = {}", class)?;
    if extended {
        writeln!(out, "Bits = {}", ipv4.to_bits())?;
        writeln!(out, "Reverse DNS = {}", ipv4.reverse_dns_name())?;
        writeln!(out, "Size = {}", ipv4.size())?;
    }
    Ok(out)
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let opts = Opts::parse();
    debug!("ipcalc {:?} extended={}", opts.address, opts.extended);

    let ipv4 = match Ipv4Address::parse(&opts.address) {
        Ok(ipv4) => ipv4,
        Err(e) => {
            eprintln!("ipcalc: {}", e);
            process::exit(1);
        }
    };
    match report(&ipv4, opts.extended) {
        Ok(out) => print!("{}", out),
        Err(e) => {
            eprintln!("ipcalc: {}", e);
            process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_address_has_no_range() {
        let out = report(&Ipv4Address::parse("8.8.8.8").unwrap(), false).unwrap();
        assert!(out.contains("Range = n/a\n"));
        assert!(out.ends_with("Class = \n"));
    }

    #[test]
    fn extended_fields_follow_class() {
        let out = report(&Ipv4Address::parse("10.0.0.1/8").unwrap(), true).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(10, lines.len());
        assert_eq!("Class = A", lines[6]);
        assert_eq!("Bits = 00001010000000000000000000000001", lines[7]);
        assert_eq!("Reverse DNS = 1.0.0.10.in-addr.arpa", lines[8]);
        assert_eq!("Size = 16777216", lines[9]);
    }
}
