#[macro_export]
macro_rules! define_id_enum {
    (
        $(#[$enum_meta:meta])*
        $enum_name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident => $key:literal : $display_name:literal
                $( | $alias:literal )*
            ),* $(,)?
        }
    ) => {
        $(#[$enum_meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum $enum_name {
            $(
                $(#[$variant_meta])*
                $variant,
            )*
            Custom(String),
        }

        impl serde::Serialize for $enum_name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.serialize_str(self.key())
            }
        }

        impl<'de> serde::Deserialize<'de> for $enum_name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let s = String::deserialize(deserializer)?;
                Ok(Self::parse(&s))
            }
        }

        impl $enum_name {
            /// Canonical lowercase key, as used in templates and on the command line
            pub fn key(&self) -> &str {
                match self {
                    $(
                        Self::$variant => $key,
                    )*
                    Self::Custom(key) => key,
                }
            }

            pub fn name(&self) -> String {
                match self {
                    $(
                        Self::$variant => $display_name.to_string(),
                    )*
                    Self::Custom(key) => key.clone(),
                }
            }

            /// Looks up a built-in variant by key or alias.
            pub fn from_key(key: &str) -> Option<Self> {
                match key {
                    $(
                        $key $(| $alias)* => Some(Self::$variant),
                    )*
                    _ => None,
                }
            }

            /// Like `from_key`, but unknown keys become `Custom`.
            pub fn parse(key: &str) -> Self {
                let key = key.trim().to_lowercase();
                Self::from_key(&key).unwrap_or(Self::Custom(key))
            }

            pub fn is_custom(&self) -> bool {
                matches!(self, Self::Custom(_))
            }

            pub fn all_variants() -> &'static [Self] {
                &[
                    $(
                        Self::$variant,
                    )*
                ]
            }
        }

        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.key())
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = std::convert::Infallible;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self::parse(s))
            }
        }
    };
}
