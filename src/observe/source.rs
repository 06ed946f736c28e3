use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::types::Guid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Parser {
    Dlt,
    SomeIp,
    Text,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Transport {
    Udp {
        bind_addr: String,
        #[serde(default)]
        multicast: Vec<String>,
    },
    Tcp {
        bind_addr: String,
    },
    Process {
        command: String,
        cwd: Option<PathBuf>,
    },
    Serial {
        path: String,
        baud_rate: u32,
    },
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transport::Udp { bind_addr, .. } => write!(f, "UDP {bind_addr}"),
            Transport::Tcp { bind_addr } => write!(f, "TCP {bind_addr}"),
            Transport::Process { command, .. } => write!(f, "Process {command}"),
            Transport::Serial { path, baud_rate } => write!(f, "Serial {path}@{baud_rate}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "origin", rename_all = "snake_case")]
pub enum Origin {
    File { path: PathBuf },
    Stream { transport: Transport },
    /// Several sources observed as one; see [`DataSource::children`]
    Concat,
}

/// Something a session observes: a file, a live stream or a group of both
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSource {
    pub uuid: Guid,
    #[serde(flatten)]
    pub origin: Origin,
    pub parser: Parser,
    #[serde(default)]
    pub children: Vec<DataSource>,
}

impl DataSource {
    pub fn file(path: impl Into<PathBuf>, parser: Parser) -> Self {
        Self {
            uuid: Guid::generate(),
            origin: Origin::File { path: path.into() },
            parser,
            children: Vec::new(),
        }
    }

    pub fn stream(transport: Transport, parser: Parser) -> Self {
        Self {
            uuid: Guid::generate(),
            origin: Origin::Stream { transport },
            parser,
            children: Vec::new(),
        }
    }

    pub fn concat(children: Vec<DataSource>, parser: Parser) -> Self {
        Self {
            uuid: Guid::generate(),
            origin: Origin::Concat,
            parser,
            children,
        }
    }

    pub fn as_file(&self) -> Option<&Path> {
        match &self.origin {
            Origin::File { path } => Some(path.as_path()),
            _ => None,
        }
    }

    pub fn as_stream(&self) -> Option<&Transport> {
        match &self.origin {
            Origin::Stream { transport } => Some(transport),
            _ => None,
        }
    }

    pub fn is_text(&self) -> bool {
        self.parser == Parser::Text
    }

    /// The source itself, or its children when it groups several
    pub fn flatten(&self) -> Vec<&DataSource> {
        if self.children.is_empty() {
            vec![self]
        } else {
            self.children.iter().collect()
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.origin {
            Origin::File { path } => write!(f, "File {}", path.display()),
            Origin::Stream { transport } => write!(f, "{transport}"),
            Origin::Concat => write!(f, "Concat of {} sources", self.children.len()),
        }
    }
}
