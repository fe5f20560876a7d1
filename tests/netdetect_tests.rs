use std::net::Ipv4Addr;
use subnet_sentry::netdetect::{ipv4_to_default_cidr, InterfaceAddress, LocalAddress, Subnet};

#[test]
fn default_cidr_is_24() {
    let cidr = ipv4_to_default_cidr(Ipv4Addr::new(192, 168, 42, 99));
    assert_eq!(cidr.to_string(), "192.168.42.0/24");
}

#[test]
fn local_host_octet_is_still_a_candidate() {
    let subnet = Subnet::from_local(Ipv4Addr::new(192, 168, 1, 42));
    let list = subnet.candidates();
    assert_eq!(list.len(), 254);
    assert_eq!(list.first(), Some(&Ipv4Addr::new(192, 168, 1, 1)));
    assert_eq!(list.last(), Some(&Ipv4Addr::new(192, 168, 1, 254)));
    assert!(list.contains(&Ipv4Addr::new(192, 168, 1, 42)));
}

#[test]
fn pinned_interface_address_wins() {
    let src = InterfaceAddress::new(Some(Ipv4Addr::new(10, 9, 8, 7)));
    assert_eq!(src.local_ipv4().unwrap(), Ipv4Addr::new(10, 9, 8, 7));
}
