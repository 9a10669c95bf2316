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

//! The configuration record of a socket and the loading of socket records
//! from configuration files.
//!
#![allow(non_snake_case)]
use crate::error::*;
use confique::Config;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// An integer that configuration may also spell as a string.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ConfValue {
    /// plain integer
    Int(i64),
    /// string, normalized when the record is resolved
    Str(String),
}

impl From<i64> for ConfValue {
    fn from(v: i64) -> Self {
        ConfValue::Int(v)
    }
}

impl From<&str> for ConfValue {
    fn from(v: &str) -> Self {
        ConfValue::Str(v.to_string())
    }
}

/// The loosely typed configuration of one socket, as handed over by the
/// supervisor's config loader. Nothing is validated until it is turned into
/// a [`Socket`](crate::Socket).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SocketConf {
    /// unique name, required
    #[serde(default)]
    pub name: String,
    /// host of network sockets, "localhost" by default
    pub host: Option<String>,
    /// port of network sockets, 0 asks the OS for an ephemeral port
    pub port: Option<ConfValue>,
    /// symbolic family, AF_INET unless path is set
    pub family: Option<String>,
    /// symbolic type, SOCK_STREAM by default
    #[serde(rename = "type")]
    pub sock_type: Option<String>,
    /// protocol name or number, 0 by default
    pub proto: Option<ConfValue>,
    /// path of a unix-domain socket
    pub path: Option<String>,
    /// umask applied while the unix-domain socket file is created
    pub umask: Option<ConfValue>,
    /// network interface the socket is restricted to
    pub interface: Option<String>,
    /// listen queue depth
    pub backlog: Option<ConfValue>,
    /// unlink a stale socket file at path before binding, true by default
    pub replace: Option<bool>,
    /// set SO_REUSEPORT on network sockets
    pub so_reuseport: Option<bool>,
    /// leave the descriptor in blocking mode
    pub blocking: Option<bool>,
}

impl SocketConf {
    /// an empty record carrying only the name
    pub fn new(name: &str) -> SocketConf {
        SocketConf {
            name: name.to_string(),
            ..Default::default()
        }
    }

    ///
    pub fn host(mut self, host: &str) -> Self {
        self.host = Some(host.to_string());
        self
    }

    ///
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(ConfValue::Int(port as i64));
        self
    }

    ///
    pub fn family(mut self, family: &str) -> Self {
        self.family = Some(family.to_string());
        self
    }

    ///
    pub fn sock_type(mut self, sock_type: &str) -> Self {
        self.sock_type = Some(sock_type.to_string());
        self
    }

    ///
    pub fn proto(mut self, proto: &str) -> Self {
        self.proto = Some(ConfValue::Str(proto.to_string()));
        self
    }

    ///
    pub fn path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.path = Some(path.as_ref().to_string_lossy().into_owned());
        self
    }

    ///
    pub fn umask(mut self, umask: u32) -> Self {
        self.umask = Some(ConfValue::Int(umask as i64));
        self
    }

    ///
    pub fn interface(mut self, interface: &str) -> Self {
        self.interface = Some(interface.to_string());
        self
    }

    ///
    pub fn backlog(mut self, backlog: usize) -> Self {
        self.backlog = Some(ConfValue::Int(backlog as i64));
        self
    }

    ///
    pub fn replace(mut self, replace: bool) -> Self {
        self.replace = Some(replace);
        self
    }

    ///
    pub fn so_reuseport(mut self, so_reuseport: bool) -> Self {
        self.so_reuseport = Some(so_reuseport);
        self
    }

    ///
    pub fn blocking(mut self, blocking: bool) -> Self {
        self.blocking = Some(blocking);
        self
    }
}

/// Socket records loaded from TOML files, one `[[Socket]]` table per socket.
///
/// ``` toml
/// [[Socket]]
/// name = "web"
/// host = "127.0.0.1"
/// port = 8080
///
/// [[Socket]]
/// name = "admin"
/// path = "/run/app/admin.sock"
/// umask = "077"
/// ```
#[derive(Config, Default, Debug)]
pub struct SocketsConfig {
    pub Socket: Option<Vec<SocketConf>>,
}

impl SocketsConfig {
    /// Load the files in order, values of later files override earlier
    /// ones.
    pub fn load(paths: &[PathBuf]) -> Result<SocketsConfig> {
        let mut builder = SocketsConfig::builder();
        // confique prefers the source added first
        for v in paths.iter().rev() {
            builder = builder.file(v);
        }
        builder.load().context(ConfiqueSnafu)
    }

    /// the socket records, in file order
    pub fn sockets(&self) -> Vec<SocketConf> {
        self.Socket.clone().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_socket_conf_setters() {
        let conf = SocketConf::new("web")
            .host("::1")
            .port(8080)
            .family("AF_INET6")
            .proto("tcp")
            .backlog(16);

        assert_eq!(conf.name, "web");
        assert_eq!(conf.host.as_deref(), Some("::1"));
        assert_eq!(conf.port, Some(ConfValue::Int(8080)));
        assert_eq!(conf.proto, Some(ConfValue::Str("tcp".to_string())));
        assert_eq!(conf.backlog, Some(ConfValue::Int(16)));
        assert_eq!(conf.path, None);
    }

    #[test]
    fn test_sockets_config_load() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("sockets.toml");
        fs::write(
            &file,
            r#"
[[Socket]]
name = "web"
host = "127.0.0.1"
port = "8080"
proto = "tcp"

[[Socket]]
name = "admin"
path = "/run/test/admin.sock"
umask = 0
type = "SOCK_DGRAM"
"#,
        )
        .unwrap();

        let config = SocketsConfig::load(&[file]).unwrap();
        let sockets = config.sockets();
        assert_eq!(sockets.len(), 2);

        assert_eq!(sockets[0].name, "web");
        assert_eq!(sockets[0].port, Some(ConfValue::Str("8080".to_string())));
        assert_eq!(sockets[0].proto, Some(ConfValue::Str("tcp".to_string())));

        assert_eq!(sockets[1].name, "admin");
        assert_eq!(sockets[1].path.as_deref(), Some("/run/test/admin.sock"));
        assert_eq!(sockets[1].umask, Some(ConfValue::Int(0)));
        assert_eq!(sockets[1].sock_type.as_deref(), Some("SOCK_DGRAM"));
    }

    #[test]
    fn test_sockets_config_unknown_field() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("bad.toml");
        fs::write(&file, "[[Socket]]\nname = \"web\"\nlisten = 80\n").unwrap();

        let e = SocketsConfig::load(&[file]).unwrap_err();
        assert!(e.is_configuration());
    }

    #[test]
    fn test_sockets_config_later_file_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("base.toml");
        let local = dir.path().join("local.toml");
        fs::write(&base, "[[Socket]]\nname = \"first\"\n").unwrap();
        fs::write(&local, "[[Socket]]\nname = \"second\"\nport = 9000\n").unwrap();

        let config = SocketsConfig::load(&[base.clone(), local.clone()]).unwrap();
        let names: Vec<String> = config.sockets().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["second"]);

        let config = SocketsConfig::load(&[local, base]).unwrap();
        let names: Vec<String> = config.sockets().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["first"]);
    }

    #[test]
    fn test_sockets_config_missing_file_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("base.toml");
        fs::write(&base, "[[Socket]]\nname = \"first\"\n").unwrap();

        let config = SocketsConfig::load(&[base, dir.path().join("absent.toml")]).unwrap();
        assert_eq!(config.sockets().len(), 1);
    }

    #[test]
    fn test_sockets_config_empty() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("empty.toml");
        fs::write(&file, "").unwrap();

        let config = SocketsConfig::load(&[file]).unwrap();
        assert!(config.sockets().is_empty());
    }
}
