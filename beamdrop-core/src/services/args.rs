//! Positional argument decoding for service methods.
//!
//! A method declares its parameters as a tuple; `FromArgs` checks the arity and
//! decodes each JSON value into the declared type.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::BridgeError;

/// Parameter list of a service method.
pub trait FromArgs: Sized {
    /// Type names of the parameters, in order.
    fn param_types() -> Vec<&'static str>;

    fn from_args(args: Vec<Value>) -> Result<Self, BridgeError>;
}

fn arity_error(expected: usize, got: usize) -> BridgeError {
    BridgeError::invalid_argument(format!("expected {} argument(s), got {}", expected, got))
}

fn decode<T: DeserializeOwned>(index: usize, value: Value) -> Result<T, BridgeError> {
    serde_json::from_value(value).map_err(|e| {
        BridgeError::invalid_argument(format!(
            "argument {} is not a valid {}: {}",
            index,
            std::any::type_name::<T>(),
            e
        ))
    })
}

macro_rules! tuple_from_args {
    ($($ty:ident),*) => {
        impl<$($ty),*> FromArgs for ($($ty,)*)
        where
            $($ty: DeserializeOwned + 'static,)*
        {
            fn param_types() -> Vec<&'static str> {
                vec![$(std::any::type_name::<$ty>()),*]
            }

            #[allow(unused_variables, unused_mut)]
            fn from_args(args: Vec<Value>) -> Result<Self, BridgeError> {
                let expected = Self::param_types().len();
                let got = args.len();
                if got != expected {
                    return Err(arity_error(expected, got));
                }

                let mut values = args.into_iter().enumerate();
                Ok(($(
                    match values.next() {
                        Some((index, value)) => decode::<$ty>(index, value)?,
                        None => return Err(arity_error(expected, got)),
                    },
                )*))
            }
        }
    };
}

tuple_from_args!();
tuple_from_args!(A);
tuple_from_args!(A, B);
tuple_from_args!(A, B, C);
tuple_from_args!(A, B, C, D);

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_matching_arguments() {
        let (name, count) = <(String, u32)>::from_args(vec![json!("World"), json!(3)]).unwrap();
        assert_eq!(name, "World");
        assert_eq!(count, 3);
    }

    #[test]
    fn empty_parameter_list() {
        assert!(<()>::param_types().is_empty());
        <()>::from_args(vec![]).unwrap();
        assert!(<()>::from_args(vec![json!(1)]).is_err());
    }

    #[test]
    fn wrong_arity_is_invalid_argument() {
        let err = <(String,)>::from_args(vec![]).unwrap_err();
        assert_eq!(err.kind(), "invalid_argument");
        assert!(err.to_string().contains("expected 1 argument(s), got 0"));
    }

    #[test]
    fn wrong_type_names_the_position() {
        let err = <(String, u32)>::from_args(vec![json!("x"), json!("three")]).unwrap_err();
        assert_eq!(err.kind(), "invalid_argument");
        assert!(err.to_string().contains("argument 1"));
    }
}
