// Copyright (c) 2022 Huawei Technologies Co.,Ltd. All rights reserved.
//
// sysMaster is licensed under Mulan PSL v2.
// You can use this software according to the terms and conditions of the Mulan
// PSL v2.
// You may obtain a copy of Mulan PSL v2 at:
//         http://license.coscl.org.cn/MulanPSL2
// THIS SOFTWARE IS PROVIDED ON AN "AS IS" BASIS, WITHOUT WARRANTIES OF ANY
// KIND, EITHER EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO
// NON-INFRINGEMENT, MERCHANTABILITY OR FIT FOR A PARTICULAR PURPOSE.
// See the Mulan PSL v2 for more details.

//! Translation of symbolic configuration values into the constants the OS
//! socket calls take. Every unresolvable value is a configuration error.

use crate::config::ConfValue;
use crate::error::*;
use basic::socket_util;
use std::{fmt, str::FromStr};

/// upper bound of a listen queue accepted from configuration
const MAX_BACKLOG: i64 = 65535;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// address family of a socket
pub enum SocketFamily {
    /// IPv4
    Inet,
    /// IPv6
    Inet6,
    /// unix-domain, addressed by a filesystem path
    Unix,
}

impl SocketFamily {
    /// the AF_* value
    pub fn as_raw(&self) -> i32 {
        match self {
            SocketFamily::Inet => libc::AF_INET,
            SocketFamily::Inet6 => libc::AF_INET6,
            SocketFamily::Unix => libc::AF_UNIX,
        }
    }

    /// IPv4 and IPv6 are bound to host and port
    pub fn is_network(&self) -> bool {
        !matches!(self, SocketFamily::Unix)
    }
}

impl FromStr for SocketFamily {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "af_inet" | "inet" | "ipv4" => Ok(SocketFamily::Inet),
            "af_inet6" | "inet6" | "ipv6" => Ok(SocketFamily::Inet6),
            "af_unix" | "af_local" | "unix" | "local" => Ok(SocketFamily::Unix),
            _ => Err(Error::Configuration {
                what: format!("unsupported socket family '{}'", s),
            }),
        }
    }
}

impl fmt::Display for SocketFamily {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            SocketFamily::Inet => "AF_INET",
            SocketFamily::Inet6 => "AF_INET6",
            SocketFamily::Unix => "AF_UNIX",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// socket type
pub enum SocketType {
    /// SOCK_STREAM
    Stream,
    /// SOCK_DGRAM
    Datagram,
    /// SOCK_SEQPACKET
    SeqPacket,
}

impl SocketType {
    /// the SOCK_* value
    pub fn as_raw(&self) -> i32 {
        match self {
            SocketType::Stream => libc::SOCK_STREAM,
            SocketType::Datagram => libc::SOCK_DGRAM,
            SocketType::SeqPacket => libc::SOCK_SEQPACKET,
        }
    }

    /// connection oriented types are put in listening state
    pub fn can_listen(&self) -> bool {
        matches!(self, SocketType::Stream | SocketType::SeqPacket)
    }
}

impl Default for SocketType {
    fn default() -> Self {
        SocketType::Stream
    }
}

impl FromStr for SocketType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "sock_stream" | "stream" => Ok(SocketType::Stream),
            "sock_dgram" | "dgram" | "datagram" => Ok(SocketType::Datagram),
            "sock_seqpacket" | "seqpacket" => Ok(SocketType::SeqPacket),
            _ => Err(Error::Configuration {
                what: format!("unsupported socket type '{}'", s),
            }),
        }
    }
}

impl fmt::Display for SocketType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            SocketType::Stream => "SOCK_STREAM",
            SocketType::Datagram => "SOCK_DGRAM",
            SocketType::SeqPacket => "SOCK_SEQPACKET",
        };
        write!(f, "{}", name)
    }
}

/// IANA protocol numbers known by name
const PROTOCOLS: &[(&str, i32)] = &[
    ("ip", 0),
    ("icmp", 1),
    ("igmp", 2),
    ("tcp", 6),
    ("udp", 17),
    ("ipv6", 41),
    ("gre", 47),
    ("esp", 50),
    ("ah", 51),
    ("icmpv6", 58),
    ("ipv6-icmp", 58),
    ("sctp", 132),
    ("udplite", 136),
    ("raw", 255),
];

/// Resolve a protocol name or number to a protocol number. Names missing
/// from the built-in table are looked up in the OS protocol database.
pub fn parse_protocol(proto: &str) -> Result<i32> {
    let proto = proto.trim();

    if let Ok(num) = proto.parse::<i32>() {
        if num < 0 {
            return Err(Error::UnknownProtocol {
                proto: proto.to_string(),
            });
        }
        return Ok(num);
    }

    let lower = proto.to_ascii_lowercase();
    PROTOCOLS
        .iter()
        .find(|(name, _)| *name == lower)
        .map(|(_, num)| *num)
        .or_else(|| socket_util::protocol_by_name(proto))
        .ok_or_else(|| Error::UnknownProtocol {
            proto: proto.to_string(),
        })
}

/// protocol given as number or name, 0 when absent
pub fn parse_protocol_value(value: Option<&ConfValue>) -> Result<i32> {
    match value {
        None => Ok(0),
        Some(ConfValue::Int(v)) => {
            i32::try_from(*v)
                .ok()
                .filter(|v| *v >= 0)
                .ok_or_else(|| Error::UnknownProtocol {
                    proto: v.to_string(),
                })
        }
        Some(ConfValue::Str(s)) => parse_protocol(s),
    }
}

fn value_to_int(field: &str, value: &ConfValue, radix: u32) -> Result<i64> {
    match value {
        ConfValue::Int(v) => Ok(*v),
        ConfValue::Str(s) => {
            let s = s.trim();
            let digits = if radix == 8 {
                s.trim_start_matches("0o")
            } else {
                s
            };
            i64::from_str_radix(digits, radix).map_err(|_| Error::Configuration {
                what: format!("{} '{}' is not a number", field, s),
            })
        }
    }
}

/// port number, 0 when absent
pub fn parse_port(value: Option<&ConfValue>) -> Result<u16> {
    let value = match value {
        None => return Ok(0),
        Some(v) => v,
    };

    let port = value_to_int("port", value, 10)?;
    u16::try_from(port).map_err(|_| Error::Configuration {
        what: format!("port {} is out of range", port),
    })
}

/// umask, strings are read as octal
pub fn parse_umask(value: Option<&ConfValue>) -> Result<Option<u32>> {
    let value = match value {
        None => return Ok(None),
        Some(v) => v,
    };

    let mask = value_to_int("umask", value, 8)?;
    if !(0..=0o777).contains(&mask) {
        return Err(Error::Configuration {
            what: format!("umask {:o} is out of range", mask),
        });
    }

    Ok(Some(mask as u32))
}

/// listen backlog, default when absent
pub fn parse_backlog(value: Option<&ConfValue>, default: usize) -> Result<usize> {
    let value = match value {
        None => return Ok(default),
        Some(v) => v,
    };

    let backlog = value_to_int("backlog", value, 10)?;
    if !(0..=MAX_BACKLOG).contains(&backlog) {
        return Err(Error::Configuration {
            what: format!("backlog {} is out of range", backlog),
        });
    }

    Ok(backlog as usize)
}
