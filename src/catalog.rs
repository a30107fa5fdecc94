//! Localised user-facing messages, looked up by stable key.
//!
//! Only the front ends use this; resolution itself reports typed errors.

use phf::phf_map;

use crate::resolver::AddressError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Locale {
    English,
    Chinese,
}

impl Locale {
    /// `zh*` selects Chinese, anything else English.
    pub fn from_tag(tag: &str) -> Self {
        if tag.to_ascii_lowercase().starts_with("zh") {
            Locale::Chinese
        } else {
            Locale::English
        }
    }

    /// First non-empty of `LC_ALL`, `LC_MESSAGES`, `LANG`.
    pub fn from_env() -> Self {
        ["LC_ALL", "LC_MESSAGES", "LANG"]
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .find(|v| !v.is_empty())
            .map(|v| Self::from_tag(&v))
            .unwrap_or(Locale::English)
    }
}

static EN: phf::Map<&'static str, &'static str> = phf_map! {
    "app.error.serverEmpty" => "Server address must not be empty",
    "app.error.addressAnalyzeFailed" => "Failed to parse server address: ",
    "ipv6.syntax" => "IPv6 address is missing the closing ']'",
    "port.invalid" => "Invalid port: ",
    "port.inRange" => "Port must be between 1 and 65535: ",
    "log.server" => "Server ",
    "log.offline" => " is offline or unreachable",
    "log.failed" => " could not be queried: ",
    "result.address" => "Address: ",
    "result.version" => "Version: ",
    "result.protocol" => "Protocol: ",
    "result.players" => "Players: ",
    "result.ping" => "Ping: ",
    "result.motd" => "MOTD: ",
    "app.server.startListenOn" => "Starting HTTP server on port ",
    "app.server.started" => "Server started, query with ",
    "app.server.or" => " or ",
};

static ZH: phf::Map<&'static str, &'static str> = phf_map! {
    "app.error.serverEmpty" => "服务器地址不能为空",
    "app.error.addressAnalyzeFailed" => "服务器地址解析失败：",
    "ipv6.syntax" => "IPv6 地址缺少右方括号 ']'",
    "port.invalid" => "无效的端口：",
    "port.inRange" => "端口必须在 1 到 65535 之间：",
    "log.server" => "服务器 ",
    "log.offline" => " 离线或无法访问",
    "log.failed" => " 查询失败：",
    "result.address" => "地址：",
    "result.version" => "版本：",
    "result.protocol" => "协议版本：",
    "result.players" => "在线玩家：",
    "result.ping" => "延迟：",
    "result.motd" => "MOTD：",
    "app.server.startListenOn" => "正在启动 HTTP 服务，端口 ",
    "app.server.started" => "服务已启动，请访问 ",
    "app.server.or" => " 或 ",
};

#[derive(Debug, Clone, Copy)]
pub struct Catalog {
    locale: Locale,
}

impl Catalog {
    pub fn new(locale: Locale) -> Self {
        Self { locale }
    }

    /// Unknown keys come back unchanged.
    pub fn get<'a>(&self, key: &'a str) -> &'a str {
        let table = match self.locale {
            Locale::English => &EN,
            Locale::Chinese => &ZH,
        };
        table.get(key).copied().unwrap_or(key)
    }

    pub fn describe(&self, err: &AddressError) -> String {
        match err {
            AddressError::Empty => self.get("app.error.serverEmpty").to_string(),
            AddressError::MalformedIpv6 => self.get("ipv6.syntax").to_string(),
            AddressError::InvalidPort(text) => format!("{}{}", self.get("port.invalid"), text),
            AddressError::PortOutOfRange(value) => format!("{}{}", self.get("port.inRange"), value),
        }
    }
}
