use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(CallId);
id_newtype!(OperatorId);
id_newtype!(TicketId);

/// Status string the registry keeps for a call record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RegistryStatus {
    #[serde(rename = "ENTRANTE")]
    Ringing,
    #[serde(rename = "ACEPTADA")]
    Accepted,
    #[serde(rename = "DECLINADA")]
    Declined,
    #[serde(rename = "FINALIZADA")]
    Finalized,
}

impl RegistryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegistryStatus::Ringing => "ENTRANTE",
            RegistryStatus::Accepted => "ACEPTADA",
            RegistryStatus::Declined => "DECLINADA",
            RegistryStatus::Finalized => "FINALIZADA",
        }
    }
}

/// State an operator can move a ringing call into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CallStateChange {
    #[serde(rename = "ACEPTADA")]
    Accepted,
    #[serde(rename = "DECLINADA")]
    Declined,
}

impl From<CallStateChange> for RegistryStatus {
    fn from(value: CallStateChange) -> Self {
        match value {
            CallStateChange::Accepted => RegistryStatus::Accepted,
            CallStateChange::Declined => RegistryStatus::Declined,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_uses_registry_wire_strings() {
        assert_eq!(
            serde_json::to_string(&RegistryStatus::Accepted).expect("json"),
            "\"ACEPTADA\""
        );
        assert_eq!(
            serde_json::from_str::<RegistryStatus>("\"ENTRANTE\"").expect("json"),
            RegistryStatus::Ringing
        );
        assert_eq!(
            serde_json::to_string(&CallStateChange::Declined).expect("json"),
            format!("\"{}\"", RegistryStatus::Declined.as_str())
        );
    }

    #[test]
    fn ids_serialize_as_bare_numbers() {
        assert_eq!(serde_json::to_string(&CallId(42)).expect("json"), "42");
        assert_eq!(CallId(42).to_string(), "42");
    }
}
