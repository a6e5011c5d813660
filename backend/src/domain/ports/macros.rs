//! `define_port_error!`, the generator behind every repository and adapter
//! error enum in `ports`.
//!
//! Each variant names its display message after `=>`, and gets a snake_case
//! constructor whose parameters accept anything convertible into the field
//! type:
//!
//! ```ignore
//! define_port_error! {
//!     pub enum SlotRepositoryError {
//!         Connection { message: String } => "slot repository connection failed: {message}",
//!         Taken { date: String, time: String } => "slot {date} {time} is already booked",
//!     }
//! }
//!
//! let err = SlotRepositoryError::taken("2025-01-10", "14:00");
//! ```
//!
//! The generated enum derives `thiserror::Error` plus `Clone` and `Eq`, so
//! mocks can return it and tests can compare it directly.

macro_rules! define_port_error {
    (
        $(#[$outer:meta])*
        pub enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident $( { $($field:ident : $ty:ty),* $(,)? } )? => $message:expr
            ),* $(,)?
        }
    ) => {
        $(#[$outer])*
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        pub enum $name {
            $(
                $(#[$variant_meta])*
                #[error($message)]
                $variant $( { $($field : $ty),* } )?,
            )*
        }

        impl $name {
            $(
                define_port_error!(@constructor $variant $( { $($field : $ty),* } )?);
            )*
        }
    };

    (@constructor $variant:ident) => {
        ::paste::paste! {
            pub fn [<$variant:snake>]() -> Self {
                Self::$variant
            }
        }
    };

    (@constructor $variant:ident { $($field:ident : $ty:ty),* }) => {
        ::paste::paste! {
            pub fn [<$variant:snake>]($($field: impl Into<$ty>),*) -> Self {
                Self::$variant { $($field: $field.into()),* }
            }
        }
    };
}

pub(crate) use define_port_error;
