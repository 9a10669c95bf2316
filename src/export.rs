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

//! Hand bound descriptors over to spawned workers through the environment.
//!
//! The supervisor passes one `LISTEN_FD_<NAME>=<fd>` variable per bound
//! socket, plus `LISTEN_FDNAMES` with the names in registry order. A worker
//! finds its inherited listening descriptor again with [`inherited_fd`].

use crate::{error::*, registry::SocketRegistry};
use basic::fd_util;
use std::os::unix::prelude::RawFd;

/// prefix of the per socket variable
pub const LISTEN_FD_PREFIX: &str = "LISTEN_FD_";
/// colon separated names of the exported sockets
pub const LISTEN_FDNAMES: &str = "LISTEN_FDNAMES";

/// The variable that carries the descriptor of the socket called name.
pub fn env_key(name: &str) -> String {
    let suffix: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();
    format!("{}{}", LISTEN_FD_PREFIX, suffix)
}

impl SocketRegistry {
    /// name and descriptor of every bound socket, in registry order
    pub fn fds(&self) -> Vec<(String, RawFd)> {
        self.iter()
            .filter_map(|s| s.fd().map(|fd| (s.name().to_string(), fd)))
            .collect()
    }

    /// Environment of a worker: one variable per bound socket followed by
    /// LISTEN_FDNAMES. Empty when nothing is bound.
    pub fn env_vars(&self) -> Vec<(String, String)> {
        let fds = self.fds();
        if fds.is_empty() {
            return Vec::new();
        }

        let names: Vec<&str> = fds.iter().map(|(name, _)| name.as_str()).collect();
        let joined = names.join(":");

        let mut vars: Vec<(String, String)> = fds
            .iter()
            .map(|(name, fd)| (env_key(name), fd.to_string()))
            .collect();
        vars.push((LISTEN_FDNAMES.to_string(), joined));
        vars
    }
}

/// Worker side: the descriptor inherited for the socket called name.
pub fn inherited_fd(name: &str) -> Result<RawFd> {
    let key = env_key(name);
    let value = std::env::var(&key).map_err(|_| Error::NotFound {
        name: name.to_string(),
    })?;

    let fd = value
        .trim()
        .parse::<RawFd>()
        .ok()
        .filter(|fd| *fd >= 0)
        .ok_or_else(|| Error::Configuration {
            what: format!("{}={} is not a descriptor", key, value),
        })?;

    if !fd_util::fd_is_valid(fd) {
        log::warn!("{}={} is not an open descriptor", key, fd);
        return Err(Error::Util {
            source: basic::Error::Nix {
                source: Errno::EBADF,
            },
        });
    }

    Ok(fd)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SocketConf;
    use nix::sys::socket::{self, sockopt};

    #[test]
    fn test_env_key() {
        assert_eq!(env_key("web"), "LISTEN_FD_WEB");
        assert_eq!(env_key("my-app.admin"), "LISTEN_FD_MY_APP_ADMIN");
        assert_eq!(env_key("0"), "LISTEN_FD_0");
    }

    #[test]
    fn test_env_vars_keys_distinct() {
        let mut mgr = SocketRegistry::new();
        mgr.add(&SocketConf::new("my-app").host("127.0.0.1")).unwrap();
        assert!(mgr.add(&SocketConf::new("my_app").host("127.0.0.1")).is_err());
        mgr.add(&SocketConf::new("my-app2").host("127.0.0.1")).unwrap();
        mgr.bind_and_listen_all().unwrap();

        let vars = mgr.env_vars();
        let mut keys: Vec<&str> = vars.iter().map(|(k, _)| k.as_str()).collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), vars.len());
        assert_eq!(vars.len(), 3);
    }

    #[test]
    fn test_env_vars() {
        let mut mgr = SocketRegistry::new();
        mgr.add(&SocketConf::new("web").host("127.0.0.1")).unwrap();
        mgr.add(&SocketConf::new("api").host("127.0.0.1")).unwrap();
        assert!(mgr.env_vars().is_empty());

        mgr.bind_and_listen_all().unwrap();
        let web = mgr.get("web").unwrap().fd().unwrap();
        let api = mgr.get("api").unwrap().fd().unwrap();

        assert_eq!(
            mgr.fds(),
            vec![("web".to_string(), web), ("api".to_string(), api)]
        );
        assert_eq!(
            mgr.env_vars(),
            vec![
                ("LISTEN_FD_WEB".to_string(), web.to_string()),
                ("LISTEN_FD_API".to_string(), api.to_string()),
                (LISTEN_FDNAMES.to_string(), "web:api".to_string()),
            ]
        );
    }

    #[test]
    fn test_inherited_fd() {
        let mut mgr = SocketRegistry::new();
        mgr.add(&SocketConf::new("inherit-test").host("127.0.0.1"))
            .unwrap();
        mgr.bind_and_listen_all().unwrap();

        for (key, value) in mgr.env_vars() {
            if key.starts_with(LISTEN_FD_PREFIX) {
                std::env::set_var(key, value);
            }
        }

        let fd = inherited_fd("inherit-test").unwrap();
        assert_eq!(Some(fd), mgr.get("inherit-test").unwrap().fd());
        assert!(socket::getsockopt(fd, sockopt::AcceptConn).unwrap());
    }

    #[test]
    fn test_inherited_fd_errors() {
        assert!(matches!(
            inherited_fd("never-exported"),
            Err(Error::NotFound { .. })
        ));

        std::env::set_var(env_key("garbage-test"), "three");
        assert!(inherited_fd("garbage-test").unwrap_err().is_configuration());

        std::env::set_var(env_key("negative-test"), "-1");
        assert!(inherited_fd("negative-test").is_err());
    }
}
