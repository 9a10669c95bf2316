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

//!  sockact binds and listens on sockets inside a long lived supervisor and hands
//!  the descriptors to the worker processes it spawns. The bound address
//!  belongs to the descriptor, not to a worker, so workers can be restarted
//!  without the address ever being released.
//!
//! #  Example:
//! ``` toml
//!  [[Socket]]
//!  name = "web"
//!  host = "0.0.0.0"
//!  port = 8080
//!  backlog = 256
//!
//!  [[Socket]]
//!  name = "admin"
//!  path = "/run/app/admin.sock"
//!  umask = "007"
//! ```
//!
//!  name
//!
//!  Required, unique within a registry. It keys the descriptor exported to workers.
//!
//!  host, port
//!
//!  Address of network sockets. host defaults to localhost, port 0 lets the
//!  OS pick an ephemeral port.
//!
//!  family, type, proto
//!
//!  AF_INET (default), AF_INET6 or AF_UNIX; SOCK_STREAM (default), SOCK_DGRAM or SOCK_SEQPACKET;
//!  a protocol name such as tcp, or a number, 0 by default.
//!
//!  path, umask, replace
//!
//!  A path selects a unix-domain socket. The umask only applies while the socket file is created.
//!  A stale socket file left at path is removed before binding unless replace is false.
//!
//!  interface
//!
//!  Restrict a network socket to one interface, binding fails where the platform cannot do it.
//!
//!  backlog, so_reuseport, blocking
//!
//!  Listen queue depth (128 by default), SO_REUSEPORT, and whether the descriptor stays blocking.

// dependency:
// error -> config -> base -> sockopt -> socket -> registry -> export

pub mod base;
pub mod config;
pub mod error;
pub mod export;
pub mod registry;
pub mod socket;
pub mod sockopt;

pub use base::{SocketFamily, SocketType};
pub use config::{ConfValue, SocketConf, SocketsConfig};
pub use error::{Error, Result};
pub use export::{env_key, inherited_fd};
pub use registry::SocketRegistry;
pub use socket::Socket;
pub use sockopt::{SockOpt, SockOptOutcome, SystemSockOpt};
