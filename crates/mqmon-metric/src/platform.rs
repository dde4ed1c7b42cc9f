//! Translation of queue-manager platform and channel-type codes into the
//! display strings used as tag values.

use std::fmt;

/// Platform the queue manager runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Unix,
    Windows,
    Zos,
    Ibmi,
    Appliance,
    Unknown,
}

impl Platform {
    pub fn from_code(code: i32) -> Self {
        match code {
            3 => Platform::Unix,
            5 => Platform::Windows,
            1 => Platform::Zos,
            4 => Platform::Ibmi,
            28 => Platform::Appliance,
            _ => Platform::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Unix => "UNIX",
            Platform::Windows => "WINDOWS",
            Platform::Zos => "ZOS",
            Platform::Ibmi => "IBMI",
            Platform::Appliance => "APPLIANCE",
            Platform::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Type of a channel, decoded from the integer code reported in channel
/// status and rendered as a tag value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelType {
    Sender,
    Server,
    Receiver,
    Requester,
    ClientConn,
    ServerConn,
    ClusterReceiver,
    ClusterSender,
    Amqp,
    Unknown,
}

impl ChannelType {
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => ChannelType::Sender,
            2 => ChannelType::Server,
            3 => ChannelType::Receiver,
            4 => ChannelType::Requester,
            6 => ChannelType::ClientConn,
            7 => ChannelType::ServerConn,
            8 => ChannelType::ClusterReceiver,
            9 => ChannelType::ClusterSender,
            11 => ChannelType::Amqp,
            _ => ChannelType::Unknown,
        }
    }

    /// Integer code as reported in channel status.
    pub fn code(&self) -> i64 {
        match self {
            ChannelType::Sender => 1,
            ChannelType::Server => 2,
            ChannelType::Receiver => 3,
            ChannelType::Requester => 4,
            ChannelType::ClientConn => 6,
            ChannelType::ServerConn => 7,
            ChannelType::ClusterReceiver => 8,
            ChannelType::ClusterSender => 9,
            ChannelType::Amqp => 11,
            ChannelType::Unknown => 0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelType::Sender => "SENDER",
            ChannelType::Server => "SERVER",
            ChannelType::Receiver => "RECEIVER",
            ChannelType::Requester => "REQUESTER",
            ChannelType::ClientConn => "CLNTCONN",
            ChannelType::ServerConn => "SVRCONN",
            ChannelType::ClusterReceiver => "CLUSRCVR",
            ChannelType::ClusterSender => "CLUSSDR",
            ChannelType::Amqp => "AMQP",
            ChannelType::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for ChannelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
