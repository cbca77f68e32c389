/*****************************************************************************************[types.rs]
Copyright (c) 2003-2006, Niklas Een, Niklas Sorensson (MiniSat)
Copyright (c) 2007-2010, Niklas Sorensson (MiniSat)

Permission is hereby granted, free of charge, to any person obtaining a copy of this software and
associated documentation files (the "Software"), to deal in the Software without restriction,
including without limitation the rights to use, copy, modify, merge, publish, distribute,
sublicense, and/or sell copies of the Software, and to permit persons to whom the Software is
furnished to do so, subject to the following conditions:

The above copyright notice and this permission notice shall be included in all copies or
substantial portions of the Software.

THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR IMPLIED, INCLUDING BUT
NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM,
DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT
OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.
**************************************************************************************************/

use crate::intmap::{AsIndex, IntMap, IntSet};
use std::fmt;
use std::ops;

/// A propositional variable, an index in `[0, num_vars)`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Var(u32);

impl Var {
    pub const UNDEF: Var = Var(!0);

    #[inline(always)]
    pub(crate) fn from_idx(idx: u32) -> Self {
        debug_assert!(idx < u32::MAX / 2, "Var::from_idx: index too large");
        Var(idx)
    }
    #[inline(always)]
    pub fn idx(&self) -> u32 {
        self.0
    }
}

impl fmt::Debug for Var {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.0 == !0 {
            write!(f, "UNDEF")
        } else {
            write!(f, "{}", self.0 + 1)
        }
    }
}

impl AsIndex for Var {
    #[inline(always)]
    fn as_index(self) -> usize {
        self.0 as usize
    }
    #[inline(always)]
    fn from_index(index: usize) -> Self {
        Var(index as u32)
    }
}

/// A literal: a variable together with a sign, encoded as `2 * var + sign`
/// so that negation is a single bit flip and both polarities can be used to
/// index side-by-side arrays.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Lit(u32);

impl Lit {
    pub const UNDEF: Lit = Lit(!1);
    pub const ERROR: Lit = Lit(!0);

    /// Make a literal from a variable; `sign == true` is the positive literal.
    #[inline(always)]
    pub fn new(var: Var, sign: bool) -> Self {
        Lit(var.0 * 2 + (!sign) as u32)
    }
    #[inline(always)]
    pub fn idx(&self) -> u32 {
        self.0
    }
    #[inline(always)]
    pub fn sign(&self) -> bool {
        (self.0 & 1) == 0
    }
    #[inline(always)]
    pub fn var(&self) -> Var {
        Var(self.0 >> 1)
    }
}

impl fmt::Debug for Lit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.0 == !0 {
            write!(f, "ERROR")
        } else if self.0 == !1 {
            write!(f, "UNDEF")
        } else {
            write!(f, "{}{}", if self.sign() { "" } else { "-" }, self.0 / 2 + 1)
        }
    }
}

impl ops::Not for Lit {
    type Output = Self;
    #[inline(always)]
    fn not(self) -> Self {
        Lit(self.0 ^ 1)
    }
}

impl ops::BitXor<bool> for Lit {
    type Output = Self;
    #[inline(always)]
    fn bitxor(self, rhs: bool) -> Self {
        Lit(self.0 ^ rhs as u32)
    }
}

impl AsIndex for Lit {
    #[inline(always)]
    fn as_index(self) -> usize {
        self.0 as usize
    }
    #[inline(always)]
    fn from_index(index: usize) -> Self {
        Lit(index as u32)
    }
}

pub type VMap<V> = IntMap<Var, V>;
pub type LMap<V> = IntMap<Lit, V>;
pub type LSet = IntSet<Lit>;

/// A ternary boolean (true, false, undefined) used for partial assignments.
#[allow(non_camel_case_types)]
#[derive(Clone, Copy)]
pub struct lbool(u8);

impl lbool {
    pub const TRUE: lbool = lbool(0);
    pub const FALSE: lbool = lbool(1);
    pub const UNDEF: lbool = lbool(2);

    pub fn from_u8(v: u8) -> Self {
        debug_assert!(v == (v & 3), "lbool::from_u8: invalid value");
        lbool(v)
    }
    #[inline(always)]
    pub fn new(v: bool) -> Self {
        lbool((!v) as u8)
    }
    #[inline(always)]
    pub fn to_u8(&self) -> u8 {
        self.0
    }
}

impl fmt::Debug for lbool {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.0 == 0 {
            write!(f, "TRUE")
        } else if self.0 == 1 {
            write!(f, "FALSE")
        } else {
            write!(f, "UNDEF")
        }
    }
}

impl Default for lbool {
    fn default() -> Self {
        lbool(0)
    }
}

// Both "undefined" encodings (2 and 3) compare equal.
impl PartialEq for lbool {
    #[inline(always)]
    fn eq(&self, rhs: &Self) -> bool {
        self.0 == rhs.0 || (self.0 & rhs.0 & 2) != 0
    }
}

impl Eq for lbool {}

impl ops::Neg for lbool {
    type Output = lbool;
    fn neg(self) -> Self {
        lbool(self.0 ^ 1)
    }
}

impl ops::BitXor<bool> for lbool {
    type Output = lbool;
    #[inline(always)]
    fn bitxor(self, rhs: bool) -> Self {
        lbool(self.0 ^ rhs as u8)
    }
}

impl ops::BitAnd for lbool {
    type Output = Self;
    fn bitand(self, rhs: Self) -> Self {
        // truth table packed into a word, indexed by both operand encodings
        let sel = (self.0 << 1) | (rhs.0 << 3);
        let v = (0xF7F7_55F4_u32 >> sel) & 3;
        lbool(v as u8)
    }
}

impl ops::BitOr for lbool {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        let sel = (self.0 << 1) | (rhs.0 << 3);
        let v = (0xFCFC_F400_u32 >> sel) & 3;
        lbool(v as u8)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_lit_encoding() {
        let v = Var::from_idx(3);
        let p = Lit::new(v, true);
        assert_eq!(p.var(), v);
        assert!(p.sign());
        assert_eq!(!p, Lit::new(v, false));
        assert_eq!(!!p, p);
        assert_eq!(p.idx() ^ 1, (!p).idx());
    }

    #[test]
    fn test_eq() {
        for i in 0..4 {
            let a = lbool::from_u8(i);
            for j in 0..4 {
                let b = lbool::from_u8(j);
                let are_eq = (i == 0 && j == 0) || (i == 1 && j == 1) || (i >= 2 && j >= 2);
                assert_eq!(are_eq, a == b, "{:?}[{}] == {:?}[{}] should be {}", a, i, b, j, are_eq);
            }
        }
    }

    #[test]
    fn test_neg() {
        assert_eq!(-lbool::TRUE, lbool::FALSE);
        assert_eq!(-lbool::FALSE, lbool::TRUE);
        assert_eq!(-lbool::UNDEF, lbool::UNDEF);
    }

    #[test]
    fn test_bitxor() {
        assert_eq!(lbool::TRUE ^ true, lbool::FALSE);
        assert_eq!(lbool::TRUE ^ false, lbool::TRUE);
        assert_eq!(lbool::FALSE ^ true, lbool::TRUE);
        assert_eq!(lbool::FALSE ^ false, lbool::FALSE);
        assert_eq!(lbool::UNDEF ^ true, lbool::UNDEF);
        assert_eq!(lbool::UNDEF ^ false, lbool::UNDEF);
    }

    #[test]
    fn test_bitand() {
        assert_eq!(lbool::TRUE & lbool::TRUE, lbool::TRUE);
        assert_eq!(lbool::TRUE & lbool::FALSE, lbool::FALSE);
        assert_eq!(lbool::FALSE & lbool::TRUE, lbool::FALSE);
        assert_eq!(lbool::FALSE & lbool::FALSE, lbool::FALSE);
        assert_eq!(lbool::UNDEF & lbool::FALSE, lbool::FALSE);
        assert_eq!(lbool::FALSE & lbool::UNDEF, lbool::FALSE);
        assert_eq!(lbool::UNDEF & lbool::TRUE, lbool::UNDEF);
        assert_eq!(lbool::TRUE & lbool::UNDEF, lbool::UNDEF);
    }

    #[test]
    fn test_bitor() {
        assert_eq!(lbool::TRUE | lbool::TRUE, lbool::TRUE);
        assert_eq!(lbool::TRUE | lbool::FALSE, lbool::TRUE);
        assert_eq!(lbool::FALSE | lbool::TRUE, lbool::TRUE);
        assert_eq!(lbool::FALSE | lbool::FALSE, lbool::FALSE);
        assert_eq!(lbool::UNDEF | lbool::FALSE, lbool::UNDEF);
        assert_eq!(lbool::FALSE | lbool::UNDEF, lbool::UNDEF);
        assert_eq!(lbool::UNDEF | lbool::TRUE, lbool::TRUE);
        assert_eq!(lbool::TRUE | lbool::UNDEF, lbool::TRUE);
    }
}
