//! Absolute, inclusive pixel bounding boxes and their exchange formats.
//!
//! Text form is `[left,right,top,bottom]`; a multi-page entity is written as
//! adjacent bracketed boxes (`[..][..]`). The binary form is a fixed 8-byte
//! record of big-endian `u16` fields in the order left, right, top, bottom.
//!
//! The binary record truncates every coordinate to 16 bits: values of 65 536
//! and above wrap silently. Consumers depend on that byte layout, so the
//! limit is kept rather than widened.
use crate::error::{LayoutError, LayoutResult};
use serde::Serialize;
use std::fmt;
use std::io::{Read, Write};
use std::str::FromStr;

/// Size of one binary bounding-box record.
pub const RECORD_LEN: usize = 8;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct BoundingBox {
    pub left: i32,
    pub right: i32,
    pub top: i32,
    pub bottom: i32,
}

impl BoundingBox {
    pub const fn new(left: i32, right: i32, top: i32, bottom: i32) -> Self {
        Self {
            left,
            right,
            top,
            bottom,
        }
    }

    /// `left < right && top < bottom`.
    pub fn is_valid(&self) -> bool {
        self.left < self.right && self.top < self.bottom
    }

    pub fn width(&self) -> i32 {
        self.right - self.left + 1
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top + 1
    }

    pub fn area(&self) -> i64 {
        self.width().max(0) as i64 * self.height().max(0) as i64
    }

    pub fn contains(&self, other: &BoundingBox) -> bool {
        self.left <= other.left
            && self.right >= other.right
            && self.top <= other.top
            && self.bottom >= other.bottom
    }

    pub fn contains_point(&self, x: i32, y: i32) -> bool {
        x >= self.left && x <= self.right && y >= self.top && y <= self.bottom
    }

    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.left <= other.right
            && other.left <= self.right
            && self.top <= other.bottom
            && other.top <= self.bottom
    }

    pub fn intersection(&self, other: &BoundingBox) -> Option<BoundingBox> {
        if !self.intersects(other) {
            return None;
        }
        Some(BoundingBox::new(
            self.left.max(other.left),
            self.right.min(other.right),
            self.top.max(other.top),
            self.bottom.min(other.bottom),
        ))
    }

    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox::new(
            self.left.min(other.left),
            self.right.max(other.right),
            self.top.min(other.top),
            self.bottom.max(other.bottom),
        )
    }

    /// Hull of every valid box in `boxes`; `None` if there is none.
    pub fn aggregate<'a, I>(boxes: I) -> Option<BoundingBox>
    where
        I: IntoIterator<Item = Option<&'a BoundingBox>>,
    {
        boxes
            .into_iter()
            .flatten()
            .filter(|b| b.is_valid())
            .fold(None, |acc: Option<BoundingBox>, b| {
                Some(acc.map_or(*b, |a| a.union(b)))
            })
    }

    pub fn translate(&self, dx: i32, dy: i32) -> BoundingBox {
        BoundingBox::new(
            self.left + dx,
            self.right + dx,
            self.top + dy,
            self.bottom + dy,
        )
    }

    /// Every coordinate negated; used as the inverse origin of [`Self::relative_to`].
    pub fn negated(&self) -> BoundingBox {
        BoundingBox::new(-self.left, -self.right, -self.top, -self.bottom)
    }

    /// Express this box in the coordinate frame whose origin is `origin`'s
    /// top-left corner.
    pub fn relative_to(&self, origin: &BoundingBox) -> BoundingBox {
        self.translate(-origin.left, -origin.top)
    }

    /// Map coordinates measured at `from_dpi` onto `to_dpi`.
    pub fn rescale(&self, from_dpi: f32, to_dpi: f32) -> BoundingBox {
        if from_dpi <= 0.0 || (from_dpi - to_dpi).abs() < f32::EPSILON {
            return *self;
        }
        let s = to_dpi / from_dpi;
        let scale = |v: i32| (v as f32 * s).round() as i32;
        BoundingBox::new(
            scale(self.left),
            scale(self.right),
            scale(self.top),
            scale(self.bottom),
        )
    }

    /// Parse `[l,r,t,b]` (brackets optional). Empty input yields `Ok(None)`.
    pub fn parse(text: &str) -> LayoutResult<Option<BoundingBox>> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        let inner = trimmed.strip_prefix('[').unwrap_or(trimmed);
        let inner = inner.strip_suffix(']').unwrap_or(inner);
        let invalid = || LayoutError::InvalidFormat(text.to_string());
        let fields = inner
            .split(',')
            .map(|f| f.trim().parse::<u32>().map_err(|_| invalid()))
            .collect::<LayoutResult<Vec<u32>>>()?;
        let &[left, right, top, bottom] = fields.as_slice() else {
            return Err(invalid());
        };
        let to_i32 = |v: u32| i32::try_from(v).map_err(|_| invalid());
        Ok(Some(BoundingBox::new(
            to_i32(left)?,
            to_i32(right)?,
            to_i32(top)?,
            to_i32(bottom)?,
        )))
    }

    /// Parse a run of adjacent bracketed boxes such as `[1,2,3,4][5,6,7,8]`.
    pub fn parse_many(text: &str) -> LayoutResult<Vec<BoundingBox>> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Ok(Vec::new());
        }
        let mut out = Vec::new();
        for part in trimmed.split("][") {
            match BoundingBox::parse(part)? {
                Some(b) => out.push(b),
                None => return Err(LayoutError::InvalidFormat(text.to_string())),
            }
        }
        Ok(out)
    }

    /// Fixed 8-byte big-endian record. Coordinates wrap at 16 bits.
    pub fn to_bytes(&self) -> [u8; RECORD_LEN] {
        let mut out = [0u8; RECORD_LEN];
        for (i, v) in [self.left, self.right, self.top, self.bottom]
            .into_iter()
            .enumerate()
        {
            out[i * 2..i * 2 + 2].copy_from_slice(&(v as u16).to_be_bytes());
        }
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> LayoutResult<BoundingBox> {
        if bytes.len() < RECORD_LEN {
            return Err(LayoutError::Truncated {
                expected: RECORD_LEN,
                actual: bytes.len(),
            });
        }
        let field = |i: usize| u16::from_be_bytes([bytes[i * 2], bytes[i * 2 + 1]]) as i32;
        Ok(BoundingBox::new(field(0), field(1), field(2), field(3)))
    }

    pub fn write_to<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        out.write_all(&self.to_bytes())
    }

    pub fn read_from<R: Read>(input: &mut R) -> std::io::Result<BoundingBox> {
        let mut buf = [0u8; RECORD_LEN];
        input.read_exact(&mut buf)?;
        let field = |i: usize| u16::from_be_bytes([buf[i * 2], buf[i * 2 + 1]]) as i32;
        Ok(BoundingBox::new(field(0), field(1), field(2), field(3)))
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{},{},{},{}]",
            self.left, self.right, self.top, self.bottom
        )
    }
}

impl FromStr for BoundingBox {
    type Err = LayoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BoundingBox::parse(s)?.ok_or_else(|| LayoutError::InvalidFormat(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_form_round_trips() {
        let b = BoundingBox::new(3, 40, 7, 90);
        assert_eq!(b.to_string(), "[3,40,7,90]");
        assert_eq!(BoundingBox::parse(&b.to_string()).unwrap(), Some(b));
        assert_eq!("12,13,14,15".parse::<BoundingBox>().unwrap().bottom, 15);
    }

    #[test]
    fn empty_text_is_none_and_garbage_is_error() {
        assert_eq!(BoundingBox::parse("").unwrap(), None);
        assert_eq!(BoundingBox::parse("   ").unwrap(), None);
        for bad in ["[1,2,3]", "[a,b,c,d]", "[1,2,3,4,5]", "[-1,2,3,4]", "1;2;3;4"] {
            assert!(
                matches!(BoundingBox::parse(bad), Err(LayoutError::InvalidFormat(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn adjacent_boxes_parse_to_array() {
        let boxes = BoundingBox::parse_many("[1,2,3,4][5,6,7,8]").unwrap();
        assert_eq!(
            boxes,
            vec![BoundingBox::new(1, 2, 3, 4), BoundingBox::new(5, 6, 7, 8)]
        );
        assert!(BoundingBox::parse_many("").unwrap().is_empty());
        assert!(BoundingBox::parse_many("[1,2,3,4][]").is_err());
    }

    #[test]
    fn binary_record_is_big_endian_u16() {
        let b = BoundingBox::new(1, 258, 3, 65535);
        let bytes = b.to_bytes();
        assert_eq!(bytes, [0, 1, 1, 2, 0, 3, 255, 255]);
        assert_eq!(BoundingBox::from_bytes(&bytes).unwrap(), b);

        let mut buf = Vec::new();
        b.write_to(&mut buf).unwrap();
        assert_eq!(BoundingBox::read_from(&mut buf.as_slice()).unwrap(), b);
        assert!(matches!(
            BoundingBox::from_bytes(&bytes[..5]),
            Err(LayoutError::Truncated { actual: 5, .. })
        ));
    }

    #[test]
    fn binary_record_wraps_large_coordinates() {
        let b = BoundingBox::new(65536 + 5, 70000, 0, 1);
        let back = BoundingBox::from_bytes(&b.to_bytes()).unwrap();
        assert_eq!(back.left, 5);
        assert_eq!(back.right, 70000 - 65536);
    }

    #[test]
    fn aggregate_hulls_valid_inputs() {
        let a = BoundingBox::new(0, 10, 0, 10);
        let b = BoundingBox::new(5, 30, -4, 8);
        let degenerate = BoundingBox::new(100, 100, 0, 5);
        let hull = BoundingBox::aggregate([Some(&a), None, Some(&b), Some(&degenerate)]).unwrap();
        assert!(hull.contains(&a) && hull.contains(&b));
        assert_eq!(hull, BoundingBox::new(0, 30, -4, 10));
        assert_eq!(BoundingBox::aggregate([Some(&a)]), Some(a));
        assert_eq!(BoundingBox::aggregate(std::iter::empty::<Option<&BoundingBox>>()), None);
        assert_eq!(BoundingBox::aggregate([Some(&degenerate), None]), None);
    }

    #[test]
    fn relative_to_is_invertible() {
        let b = BoundingBox::new(120, 300, 45, 80);
        let origin = BoundingBox::new(100, 500, 40, 900);
        let rel = b.relative_to(&origin);
        assert_eq!(rel, BoundingBox::new(20, 200, 5, 40));
        assert_eq!(rel.relative_to(&origin.negated()), b);
    }

    #[test]
    fn rescale_maps_between_resolutions() {
        let b = BoundingBox::new(30, 60, 90, 120);
        assert_eq!(b.rescale(300.0, 600.0), BoundingBox::new(60, 120, 180, 240));
        assert_eq!(b.rescale(300.0, 300.0), b);
    }

    #[test]
    fn intersection_and_containment() {
        let a = BoundingBox::new(0, 10, 0, 10);
        let b = BoundingBox::new(5, 15, 5, 15);
        assert_eq!(a.intersection(&b), Some(BoundingBox::new(5, 10, 5, 10)));
        assert!(a.intersection(&BoundingBox::new(11, 12, 0, 1)).is_none());
        assert_eq!(a.width(), 11);
        assert!(a.contains_point(10, 10));
    }
}
