//! Enumerations shared by the payload templates.
//!
//! Each enum serializes to the exact spelling the platform expects and can be
//! parsed back from that spelling.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TemplateError;

macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $($(#[$variant_meta:meta])* $variant:ident => $wire:literal,)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                $(#[$variant_meta])*
                #[serde(rename = $wire)]
                $variant,
            )+
        }

        impl $name {
            /// All variants in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// Wire spelling of the variant.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $wire,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = TemplateError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                match value {
                    $($wire => Ok(Self::$variant),)+
                    other => Err(TemplateError::invalid_argument(format!(
                        concat!("unknown ", stringify!($name), " value '{}'"),
                        other
                    ))),
                }
            }
        }
    };
}

wire_enum! {
    /// Canonical permission categories a custom permission maps to.
    pub enum OaaPermission {
        /// Read data.
        DataRead => "DataRead",
        /// Modify data.
        DataWrite => "DataWrite",
        /// Create data.
        DataCreate => "DataCreate",
        /// Delete data.
        DataDelete => "DataDelete",
        /// Read metadata.
        MetadataRead => "MetadataRead",
        /// Modify metadata.
        MetadataWrite => "MetadataWrite",
        /// Create metadata.
        MetadataCreate => "MetadataCreate",
        /// Delete metadata.
        MetadataDelete => "MetadataDelete",
        /// Access that does not touch data.
        NonData => "NonData",
        /// Access with no canonical category.
        Uncategorized => "Uncategorized",
    }
}

wire_enum! {
    /// Kinds of identity that can hold permissions in a custom application.
    pub enum OaaIdentityType {
        /// Local application user.
        LocalUser => "local_user",
        /// Local application group.
        LocalGroup => "local_group",
        /// Local application role.
        LocalRole => "local_role",
        /// Identity from an external identity provider.
        Idp => "idp",
        /// Local access credential such as an API key.
        AccessCred => "local_access_creds",
    }
}

wire_enum! {
    /// Value types a custom property can be declared with.
    pub enum OaaPropertyType {
        /// `true` or `false`.
        Boolean => "BOOLEAN",
        /// Integer or floating point number.
        Number => "NUMBER",
        /// Free text.
        String => "STRING",
        /// List of strings.
        StringList => "STRING_LIST",
        /// RFC 3339 timestamp.
        Timestamp => "TIMESTAMP",
    }
}

wire_enum! {
    /// Classification of a local user.
    pub enum LocalUserType {
        /// Person.
        Human => "human",
        /// Non-person service account.
        ServiceAccount => "service_account",
    }
}

wire_enum! {
    /// Identity provider families.
    pub enum IdpProviderType {
        /// Active Directory.
        ActiveDirectory => "active_directory",
        /// Any provider.
        Any => "any",
        /// Azure AD.
        AzureAd => "azure_ad",
        /// Custom identity provider.
        Custom => "custom",
        /// Google Workspace.
        GoogleWorkspace => "google_workspace",
        /// Okta.
        Okta => "okta",
        /// OneLogin.
        OneLogin => "one_login",
    }
}

wire_enum! {
    /// Classification of an identity provider user.
    pub enum IdpUserIdentityType {
        /// Person.
        Human => "HUMAN",
        /// Non-person account.
        NonHuman => "NONHUMAN",
    }
}

wire_enum! {
    /// Provider template a payload is submitted under.
    pub enum CustomTemplate {
        /// Custom application payloads.
        Application => "application",
        /// Custom identity provider payloads.
        IdentityProvider => "identity_provider",
        /// HRIS payloads.
        Hris => "hris",
    }
}

#[cfg(test)]
mod tests {
    //! Wire spelling checks.

    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::access_cred(OaaIdentityType::AccessCred, "\"local_access_creds\"")]
    #[case::idp(OaaIdentityType::Idp, "\"idp\"")]
    fn identity_types_serialize_to_wire_names(
        #[case] identity_type: OaaIdentityType,
        #[case] expected: &str,
    ) {
        let json = serde_json::to_string(&identity_type).expect("serializes");
        assert_eq!(json, expected);
    }

    #[test]
    fn parses_every_property_type() {
        for property_type in OaaPropertyType::ALL {
            let parsed: OaaPropertyType = property_type
                .as_str()
                .parse()
                .expect("wire name parses back");
            assert_eq!(parsed, *property_type);
        }
    }

    #[test]
    fn rejects_unknown_template() {
        let error = "database".parse::<CustomTemplate>().expect_err("unknown template");
        assert_eq!(
            error.to_string(),
            "unknown CustomTemplate value 'database'"
        );
    }

    #[test]
    fn permissions_display_their_names() {
        assert_eq!(OaaPermission::MetadataRead.to_string(), "MetadataRead");
        assert_eq!(IdpProviderType::AzureAd.to_string(), "azure_ad");
    }
}
