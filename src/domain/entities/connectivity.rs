use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConnectivityEvent {
    BecameOnline,
    BecameOffline,
}

impl ConnectivityEvent {
    pub fn from_online(online: bool) -> Self {
        if online {
            ConnectivityEvent::BecameOnline
        } else {
            ConnectivityEvent::BecameOffline
        }
    }

    pub fn is_online(self) -> bool {
        matches!(self, ConnectivityEvent::BecameOnline)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ConnectivityEvent::BecameOnline => "became-online",
            ConnectivityEvent::BecameOffline => "became-offline",
        }
    }
}
