//! The value type system: integers, pointers of arbitrary depth, and
//! fixed-rank arrays, plus the pure type rules consulted by the
//! expression and statement translators.

use smallvec::SmallVec;

use crate::error::{Error, Result};

/// Most array declarations in MiniDecaf source are 1- or 2-dimensional,
/// so a small inline buffer avoids a heap allocation for the common case.
pub type Dims = SmallVec<[u32; 2]>;

/// A value type: `int`, possibly nested under `ptr_depth` pointer
/// indirections, possibly shaped as an array of `dims`.
///
/// Invariants: a type with a non-empty `dims` is an array and is never
/// the destination of an assignment; the size of a non-array is 8
/// bytes, and the size of an array is `prod(dims) * 8`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Type {
    ptr_depth: u32,
    dims: Dims,
}

impl Type {
    /// The base `int` type.
    #[must_use]
    pub fn int() -> Type { Type { ptr_depth: 0, dims: Dims::new() } }

    /// Construct a pointer-to-`int` with the given indirection depth.
    #[must_use]
    pub fn ptr(depth: u32) -> Type {
        Type { ptr_depth: depth, dims: Dims::new() }
    }

    /// Attach array dimensions to this type.
    #[must_use]
    pub fn to_array(mut self, dims: Dims) -> Type {
        self.dims = dims;
        self
    }

    /// True if this type is (still) shaped as an array.
    #[must_use]
    pub fn is_array(&self) -> bool { !self.dims.is_empty() }

    /// True if this type is a pointer (and not an array).
    #[must_use]
    pub fn is_pointer(&self) -> bool { self.ptr_depth > 0 && !self.is_array() }

    /// True if this is the bare `int` type (no pointer, no array).
    #[must_use]
    pub fn is_int(&self) -> bool { self.ptr_depth == 0 && !self.is_array() }

    /// `prod(dims) * 8` for an array, `8` for anything else.
    #[must_use]
    pub fn size_of(&self) -> u32 {
        if self.dims.is_empty() {
            8
        } else {
            self.dims.iter().product::<u32>() * 8
        }
    }

    /// Add one level of pointer indirection.
    #[must_use]
    pub fn wrap_ptr(&self) -> Type {
        Type { ptr_depth: self.ptr_depth + 1, dims: self.dims.clone() }
    }

    /// Remove one level of pointer indirection. Requires `ptr_depth > 0`.
    pub fn unwrap_ptr(&self) -> Result<Type> {
        if self.ptr_depth == 0 {
            return Err(Error::Type(format!("cannot dereference non-pointer type {self}")));
        }
        Ok(Type { ptr_depth: self.ptr_depth - 1, dims: self.dims.clone() })
    }

    /// The type of `a[i]` for `a: Self`: drop the first array dimension.
    /// If no dimensions remain this is the element (scalar or pointer)
    /// type; otherwise it is the next-ranked array.
    ///
    /// Requires `self` to be an array.
    pub fn next_array_level(&self) -> Result<Type> {
        if self.dims.is_empty() {
            return Err(Error::Type(format!("cannot index non-array type {self}")));
        }
        Ok(Type { ptr_depth: self.ptr_depth, dims: self.dims[1..].iter().copied().collect() })
    }

    /// Drop all array dimensions, leaving the element type (what an
    /// array-typed identifier decays to when read).
    #[must_use]
    pub fn array_base(&self) -> Type {
        Type { ptr_depth: self.ptr_depth, dims: Dims::new() }
    }

    /// The type an array-typed value decays to when it is read as a
    /// plain expression (not as the immediate base of `[...]`): a
    /// pointer to its element type. `int[3]` decays to `int*`.
    #[must_use]
    pub fn decay(&self) -> Type {
        self.array_base().wrap_ptr()
    }
}

impl std::fmt::Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "int")?;
        for _ in 0..self.ptr_depth { write!(f, "*")?; }
        for d in &self.dims { write!(f, "[{d}]")?; }
        Ok(())
    }
}

/// `unary_int`: the unary `-` operand must be `int`.
pub fn unary_int(t: &Type) -> Result<Type> {
    if t.is_int() { Ok(Type::int()) } else { Err(Error::Type(format!("unary `-` requires int, found {t}"))) }
}

/// `binary_int`: both operands must be `int`; result is `int`. Used for
/// `* / %` unconditionally, and as the fallback for `+`/`-`.
pub fn binary_int(t1: &Type, t2: &Type) -> Result<Type> {
    if t1.is_int() && t2.is_int() {
        Ok(Type::int())
    } else {
        Err(Error::Type(format!("expected two ints, found {t1} and {t2}")))
    }
}

/// `binary_ptr_arith`: exactly one of `t1`, `t2` must be a pointer and
/// the other an `int`; the result is the pointer type. Two pointers
/// together are rejected (this also covers pointer-minus-pointer, kept
/// strict per the open-question resolution).
pub fn binary_ptr_arith(t1: &Type, t2: &Type) -> Result<Type> {
    match (t1.is_pointer(), t2.is_pointer()) {
        (true, false) if t2.is_int() => Ok(t1.clone()),
        (false, true) if t1.is_int() => Ok(t2.clone()),
        _ => Err(Error::Type(format!("expected int and pointer, found {t1} and {t2}"))),
    }
}

/// `same_type`: the two operands must be identical; result is `int`
/// (relational operators always produce a boolean-as-int).
pub fn same_type(t1: &Type, t2: &Type) -> Result<Type> {
    if t1 == t2 {
        Ok(Type::int())
    } else {
        Err(Error::Type(format!("type mismatch: {t1} vs {t2}")))
    }
}

/// `deref`: `t` must be a pointer; result is `unwrap_ptr(t)`.
pub fn deref(t: &Type) -> Result<Type> {
    if !t.is_pointer() {
        return Err(Error::Type(format!("cannot dereference non-pointer type {t}")));
    }
    t.unwrap_ptr()
}

/// Assignment requires equal types, and the destination must not be an
/// array (arrays are never assigned to).
pub fn assignable(dst: &Type, src: &Type) -> Result<()> {
    if dst.is_array() {
        return Err(Error::Type(format!("cannot assign to array type {dst}")));
    }
    if dst != src {
        return Err(Error::Type(format!("cannot assign {src} to {dst}")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes() {
        assert_eq!(Type::int().size_of(), 8);
        assert_eq!(Type::ptr(1).size_of(), 8);
        let arr = Type::int().to_array(Dims::from_slice(&[3]));
        assert_eq!(arr.size_of(), 24);
        let arr2 = Type::int().to_array(Dims::from_slice(&[2, 3]));
        assert_eq!(arr2.size_of(), 48);
    }

    #[test]
    fn wrap_unwrap_roundtrip() {
        let p = Type::int().wrap_ptr();
        assert!(p.is_pointer());
        assert_eq!(p.unwrap_ptr().unwrap(), Type::int());
        assert!(Type::int().unwrap_ptr().is_err());
    }

    #[test]
    fn array_levels() {
        let a = Type::int().to_array(Dims::from_slice(&[2, 3]));
        let lvl1 = a.next_array_level().unwrap();
        assert_eq!(lvl1, Type::int().to_array(Dims::from_slice(&[3])));
        let lvl2 = lvl1.next_array_level().unwrap();
        assert_eq!(lvl2, Type::int());
        assert!(lvl2.next_array_level().is_err());
    }

    #[test]
    fn array_decays_to_pointer_base() {
        let a = Type::int().to_array(Dims::from_slice(&[3]));
        assert_eq!(a.array_base(), Type::int());
        let pa = Type::ptr(1).to_array(Dims::from_slice(&[3]));
        assert_eq!(pa.array_base(), Type::ptr(1));
    }

    #[test]
    fn decay_turns_array_into_pointer_to_element() {
        let a = Type::int().to_array(Dims::from_slice(&[3]));
        assert_eq!(a.decay(), Type::ptr(1));
        assert!(a.decay().is_pointer());
    }

    #[test]
    fn ptr_arith_scales_one_side_only() {
        let p = Type::ptr(1);
        assert_eq!(binary_ptr_arith(&p, &Type::int()).unwrap(), p);
        assert_eq!(binary_ptr_arith(&Type::int(), &p).unwrap(), p);
        assert!(binary_ptr_arith(&p, &p).is_err());
        assert!(binary_ptr_arith(&Type::int(), &Type::int()).is_err());
    }

    #[test]
    fn assignment_rejects_arrays_and_mismatches() {
        let arr = Type::int().to_array(Dims::from_slice(&[2]));
        assert!(assignable(&arr, &arr).is_err());
        assert!(assignable(&Type::int(), &Type::ptr(1)).is_err());
        assert!(assignable(&Type::int(), &Type::int()).is_ok());
    }
}
