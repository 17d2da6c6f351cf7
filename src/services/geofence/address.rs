//! IP 地址校验与私有地址判断

use std::net::{IpAddr, Ipv6Addr};

use crate::errors::{GeofenceError, Result};

/// 解析 IPv4 / IPv6 字面量，失败返回 `InvalidAddress`
pub fn parse_ip(ip: &str) -> Result<IpAddr> {
    ip.parse::<IpAddr>().map_err(|_| {
        GeofenceError::invalid_address(format!("invalid IP address provided: {:?}", ip))
    })
}

/// 是否为私有网段或回环地址
///
/// IPv4-mapped IPv6 地址按 IPv4 规则判断；IPv6 私有网段指 fc00::/7。
pub fn is_private_or_loopback(ip: IpAddr) -> bool {
    match ip.to_canonical() {
        IpAddr::V4(v4) => v4.is_private() || v4.is_loopback(),
        IpAddr::V6(v6) => v6.is_loopback() || is_unique_local(&v6),
    }
}

fn is_unique_local(ip: &Ipv6Addr) -> bool {
    (ip.segments()[0] & 0xfe00) == 0xfc00
}
