//! Macros for declaring state keys.

/// Declare a fieldless enum usable as a state key.
///
/// Adds the derives the runtime needs, a `name()` accessor and an `ALL`
/// list of variants in declaration order.
///
/// # Example
///
/// ```
/// use statetree::state_key;
///
/// state_key! {
///     pub enum Screen {
///         Root,
///         Menu,
///         Game,
///     }
/// }
///
/// assert_eq!(Screen::Menu.name(), "Menu");
/// assert_eq!(Screen::ALL.len(), 3);
/// ```
#[macro_export]
macro_rules! state_key {
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
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                $variant
            ),*
        }

        impl $name {
            /// Every variant, in declaration order.
            #[allow(dead_code)]
            pub const ALL: &'static [Self] = &[$(Self::$variant),*];

            #[allow(dead_code)]
            pub fn name(&self) -> &'static str {
                match self {
                    $(Self::$variant => stringify!($variant)),*
                }
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::core::StateKey;

    state_key! {
        enum TestKey {
            Root,
            Loading,
            Playing,
        }
    }

    fn assert_key<K: StateKey>(_: K) {}

    #[test]
    fn state_key_macro_generates_key_type() {
        assert_key(TestKey::Root);
        assert_eq!(TestKey::Loading.name(), "Loading");
        assert_eq!(TestKey::ALL, &[TestKey::Root, TestKey::Loading, TestKey::Playing]);
    }

    #[test]
    fn state_key_supports_visibility() {
        state_key! {
            pub enum PublicKey {
                A,
                B,
            }
        }

        assert_ne!(PublicKey::A, PublicKey::B);
    }
}
