//! `define_port_error!` generates port error enums with `thiserror` messages
//! and snake-case constructor functions for every variant.

macro_rules! define_port_error {
    (@ctor $variant:ident) => {
        ::paste::paste! {
            pub fn [<$variant:snake>]() -> Self {
                Self::$variant
            }
        }
    };

    (@ctor $variant:ident { $($field:ident : $ty:ty),* $(,)? }) => {
        define_port_error!(@ctor_impl $variant () () $( $field : $ty, )*);
    };

    (@ctor_impl $variant:ident ($($params:tt)*) ($($inits:tt)*) ) => {
        ::paste::paste! {
            pub fn [<$variant:snake>]($($params)*) -> Self {
                Self::$variant { $($inits)* }
            }
        }
    };

    (@ctor_impl $variant:ident ($($params:tt)*) ($($inits:tt)*) $field:ident : $ty:ty, $($rest:tt)*) => {
        define_port_error!(
            @ctor_impl
            $variant
            ($($params)* $field: impl Into<$ty>,)
            ($($inits)* $field: $field.into(),)
            $($rest)*
        );
    };
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
                define_port_error!(@ctor $variant $( { $($field : $ty),* } )?);
            )*
        }
    };
}

pub(crate) use define_port_error;

#[cfg(test)]
mod tests {
    define_port_error! {
        pub enum LedgerPortError {
            Connection { message: String } => "ledger connection failed: {message}",
            ItemNotFound => "item not found",
            RoomNotEmpty { item_count: u64 } => "room still holds {item_count} items",
        }
    }

    #[test]
    fn string_fields_accept_str() {
        let err = LedgerPortError::connection("refused");
        assert_eq!(err.to_string(), "ledger connection failed: refused");
    }

    #[test]
    fn unit_variants_get_constructors() {
        assert_eq!(LedgerPortError::item_not_found(), LedgerPortError::ItemNotFound);
    }

    #[test]
    fn numeric_fields_keep_their_type() {
        let err = LedgerPortError::room_not_empty(3_u64);
        assert_eq!(err.to_string(), "room still holds 3 items");
    }
}
