//! Macros for ergonomic state machine construction.

/// Declare a fieldless enum usable as a machine state.
///
/// Derives everything [`State`](crate::core::State) requires plus
/// `Copy` and serde support, and adds an `ALL` list of variants in
/// declaration order, a `name()` accessor and a `Display` impl.
///
/// # Example
///
/// ```
/// use switchyard::state_enum;
///
/// state_enum! {
///     pub enum Light {
///         Red,
///         Green,
///         Yellow,
///     }
/// }
///
/// assert_eq!(Light::ALL, &[Light::Red, Light::Green, Light::Yellow]);
/// assert_eq!(Light::Green.name(), "Green");
/// assert_eq!(Light::Yellow.to_string(), "Yellow");
/// ```
#[macro_export]
macro_rules! state_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(
            Clone, Copy, PartialEq, Eq, Hash, Debug, serde::Serialize, serde::Deserialize,
        )]
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                $variant
            ),*
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),*];

            pub fn name(&self) -> &'static str {
                match self {
                    $(Self::$variant => stringify!($variant)),*
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.name())
            }
        }
    };
}
