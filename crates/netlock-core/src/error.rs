//! Error types for the netlock core

use thiserror::Error;

use crate::address::Address;
use crate::device::Position;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Invalid MAC address: {0}")]
    InvalidAddress(String),

    #[error("Device already exists: {0}")]
    AddressAlreadyExists(Address),

    #[error("Device in position {0} is already added")]
    PositionTaken(Position),

    #[error("Device not found: {0}")]
    DeviceNotFound(Address),

    #[error("Admin address already exists: {0}")]
    AdminAddressExists(Address),

    #[error("Admin address not found: {0}")]
    AdminAddressNotFound(Address),

    #[error("Cannot remove the last admin address")]
    CannotRemoveLastAdmin,

    #[error("Bad time: {0}")]
    InvalidTime(String),

    #[error("Time not set")]
    NoTimeProvided,

    #[error("No admin password set")]
    NoAdminPasswordSet,

    #[error("New password can't be the same as old one")]
    SamePassword,

    #[error("No token provided")]
    NoTokenProvided,

    #[error("No password provided")]
    NoPasswordProvided,

    #[error("Password can't start or end with whitespace")]
    PasswordWhitespace,

    #[error("No command provided")]
    NoCommandProvided,

    #[error("No setting provided")]
    NoSettingProvided,

    #[error("Missing field: {0}")]
    MissingField(&'static str),

    #[error("Cryptographic error: {0}")]
    Crypto(String),
}

impl Error {
    /// Whether the error means the addressed record does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::DeviceNotFound(_) | Error::AdminAddressNotFound(_)
        )
    }
}
