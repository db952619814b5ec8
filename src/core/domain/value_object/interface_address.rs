use crate::core::domain::error::ValidationError;
use std::fmt;
use std::net::IpAddr;

/// An address configured on a dataplane interface: `IP` or `IP/prefix`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InterfaceAddress {
    ip: IpAddr,
    prefix: Option<u8>,
}

impl InterfaceAddress {
    /// Parses and validates an interface address.
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        validate_interface_address(value)?;
        let (ip, prefix) = split(value);
        // Both parts were checked above.
        match (ip.parse::<IpAddr>(), prefix.map(str::parse::<u8>).transpose()) {
            (Ok(ip), Ok(prefix)) => Ok(Self { ip, prefix }),
            _ => Err(ValidationError::Format(format!(
                "Invalid interface address '{}'",
                value
            ))),
        }
    }

    #[must_use]
    pub fn ip(&self) -> IpAddr {
        self.ip
    }

    #[must_use]
    pub fn prefix(&self) -> Option<u8> {
        self.prefix
    }
}

impl fmt::Display for InterfaceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.prefix {
            Some(prefix) => write!(f, "{}/{}", self.ip, prefix),
            None => write!(f, "{}", self.ip),
        }
    }
}

fn split(value: &str) -> (&str, Option<&str>) {
    match value.split_once('/') {
        Some((ip, prefix)) => (ip, Some(prefix)),
        None => (value, None),
    }
}

/// Validates the syntax of an interface address.
pub(crate) fn validate_interface_address(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Field {
            field: "ip_address".to_string(),
            message: "Address cannot be empty".to_string(),
        });
    }

    let (ip, prefix) = split(value);
    let ip: IpAddr = ip
        .parse()
        .map_err(|_| ValidationError::Format(format!("'{}' is not a valid IP address", ip)))?;

    if let Some(prefix) = prefix {
        let max = if ip.is_ipv4() { 32 } else { 128 };
        let length: u8 = prefix.parse().map_err(|_| {
            ValidationError::Format(format!("'{}' is not a valid prefix length", prefix))
        })?;
        if length > max {
            return Err(ValidationError::ConstraintViolation(format!(
                "Prefix length {} exceeds {} for {}",
                length, max, ip
            )));
        }
    }

    Ok(())
}
