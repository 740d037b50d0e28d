//! Encoded size estimation for ABI argument lists.
//!
//! Follows the formal encoding rules: every static value takes one 32-byte
//! word, dynamic values take an offset word plus a length word plus their
//! data. `n` is the element count assumed for every dynamic array and the
//! byte length assumed for every string or bytes value.
//!
//! Dynamic types are only sized at the top level (or directly inside a
//! top-level tuple). Anywhere deeper the offsets depend on sibling lengths,
//! so the estimate fails instead.

use alloy_dyn_abi::DynSolType;

use crate::error::CodecError;

const WORD: usize = 32;

/// Returns the encoded size of `args` with `n` elements per dynamic array.
pub fn max_size(n: usize, args: &[DynSolType]) -> Result<usize, CodecError> {
    args.iter().try_fold(0, |size, arg| {
        let (arg_size, _) = type_size(n, arg, true, false)?;
        Ok(size + arg_size)
    })
}

/// Returns the size of `ty` and whether it is dynamic.
fn type_size(n: usize, ty: &DynSolType, dynamic_allowed: bool, nested: bool) -> Result<(usize, bool), CodecError> {
    match ty {
        DynSolType::FixedArray(elem, len) => {
            let (elem_size, _) = type_size(n, elem, false, true)?;
            Ok((elem_size * len, false))
        }
        DynSolType::Array(elem) => {
            require_static_position(ty, dynamic_allowed)?;
            let (elem_size, _) = type_size(n, elem, false, true)?;
            // offset + length + elements
            Ok((2 * WORD + elem_size * n, true))
        }
        DynSolType::Bytes | DynSolType::String => {
            require_static_position(ty, dynamic_allowed)?;
            Ok((2 * WORD + n.div_ceil(WORD) * WORD, true))
        }
        DynSolType::Tuple(members) => tuple_size(n, members, nested),
        _ => Ok((WORD, false)),
    }
}

fn tuple_size(n: usize, members: &[DynSolType], nested: bool) -> Result<(usize, bool), CodecError> {
    let mut size = 0;
    let mut dynamic = false;
    for member in members {
        let (member_size, member_dynamic) = type_size(n, member, !nested, true)?;
        size += member_size;
        dynamic |= member_dynamic;
    }
    if dynamic {
        // offset of the tuple itself
        size += WORD;
    }
    Ok((size, dynamic))
}

fn require_static_position(ty: &DynSolType, dynamic_allowed: bool) -> Result<(), CodecError> {
    if dynamic_allowed {
        Ok(())
    } else {
        Err(CodecError::NestedDynamic {
            ty: ty.sol_type_name().into_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use alloy_dyn_abi::DynSolValue;
    use alloy_primitives::{I256, U256};

    fn parse(types: &[&str]) -> Vec<DynSolType> {
        types.iter().map(|t| DynSolType::parse(t).unwrap()).collect()
    }

    fn encoded_len(values: Vec<DynSolValue>) -> usize {
        DynSolValue::Tuple(values).abi_encode_params().len()
    }

    fn uint(v: u64) -> DynSolValue {
        DynSolValue::Uint(U256::from(v), 256)
    }

    fn uints(n: usize) -> DynSolValue {
        DynSolValue::Array((0..n as u64).map(uint).collect())
    }

    #[test]
    fn test_scalars() {
        let types = parse(&["uint256", "int8", "bool", "address", "bytes32"]);
        assert_eq!(max_size(10, &types).unwrap(), 5 * 32);
        let actual = encoded_len(vec![
            uint(1),
            DynSolValue::Int(I256::try_from(-1i64).unwrap(), 8),
            DynSolValue::Bool(true),
            DynSolValue::Address(Default::default()),
            DynSolValue::FixedBytes(Default::default(), 32),
        ]);
        assert_eq!(max_size(10, &types).unwrap(), actual);
    }

    #[test]
    fn test_fixed_array() {
        let types = parse(&["uint256[3]", "bool"]);
        let actual = encoded_len(vec![
            DynSolValue::FixedArray(vec![uint(1), uint(2), uint(3)]),
            DynSolValue::Bool(false),
        ]);
        assert_eq!(max_size(10, &types).unwrap(), actual);
        assert_eq!(actual, 4 * 32);
    }

    #[test]
    fn test_dynamic_slice() {
        let n = 10;
        let types = parse(&["uint256[]", "uint256[2][]"]);
        let pairs = DynSolValue::Array(
            (0..n as u64)
                .map(|i| DynSolValue::FixedArray(vec![uint(i), uint(i + 1)]))
                .collect(),
        );
        let actual = encoded_len(vec![uints(n), pairs]);
        assert_eq!(max_size(n, &types).unwrap(), actual);
    }

    #[test]
    fn test_string_and_bytes() {
        for n in [0usize, 1, 10, 32, 33, 64] {
            let types = parse(&["string", "bytes"]);
            let actual = encoded_len(vec![
                DynSolValue::String("x".repeat(n)),
                DynSolValue::Bytes(vec![7u8; n]),
            ]);
            assert_eq!(max_size(n, &types).unwrap(), actual, "n = {}", n);
        }
    }

    #[test]
    fn test_tuples() {
        let n = 10;
        let types = parse(&["(uint256,bool)", "(uint256,uint256[])"]);
        let actual = encoded_len(vec![
            DynSolValue::Tuple(vec![uint(1), DynSolValue::Bool(true)]),
            DynSolValue::Tuple(vec![uint(2), uints(n)]),
        ]);
        assert_eq!(max_size(n, &types).unwrap(), actual);

        // One offset word for the tuple, however many dynamic members it has.
        let types = parse(&["(uint256[],uint256[],string)"]);
        let actual = encoded_len(vec![DynSolValue::Tuple(vec![
            uints(n),
            uints(n),
            DynSolValue::String("x".repeat(n)),
        ])]);
        assert_eq!(max_size(n, &types).unwrap(), actual);
        assert_eq!(actual, 896);
    }

    #[test]
    fn test_static_tuple_in_slice() {
        let n = 4;
        let types = parse(&["(uint256,bool)[]"]);
        let actual = encoded_len(vec![DynSolValue::Array(
            (0..n as u64)
                .map(|i| DynSolValue::Tuple(vec![uint(i), DynSolValue::Bool(false)]))
                .collect(),
        )]);
        assert_eq!(max_size(n, &types).unwrap(), actual);
    }

    #[test]
    fn test_nested_dynamic_is_rejected() {
        for ty in ["string[]", "uint256[][2]", "bytes[3]", "(uint256[])[]", "(uint256,(string))"] {
            let err = max_size(10, &parse(&[ty])).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidType, "{}", ty);
        }
    }
}
