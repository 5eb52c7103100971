use super::Endianness;
use nom::number::complete::{
    be_f32, be_f64, be_i16, be_i32, be_i64, be_u16, be_u32, be_u64, le_f32, le_f64, le_i16,
    le_i32, le_i64, le_u16, le_u32, le_u64,
};

/// Primitive types with a fixed catalog name. The catalog only records a name and a size for primitives, so these
/// names are what ties a field to a Rust type.
pub(crate) trait BlendPrimitive: Sized {
    fn parse(data: &[u8], endianness: Endianness) -> Option<Self>;
    fn blender_names() -> &'static [&'static str];
}

macro_rules! blend_primitive {
    ($t:ty, $parse:ident, [$($name:expr),+]) => {
        impl BlendPrimitive for $t {
            fn parse(data: &[u8], endianness: Endianness) -> Option<Self> {
                $parse(data, endianness)
            }
            fn blender_names() -> &'static [&'static str] {
                &[$($name),+]
            }
        }
    };
}

blend_primitive!(u8, parse_u8, ["char", "uchar", "uint8_t"]);
blend_primitive!(i8, parse_i8, ["int8_t"]);
blend_primitive!(u16, parse_u16, ["ushort", "uint16_t"]);
blend_primitive!(i16, parse_i16, ["short", "int16_t"]);
blend_primitive!(u32, parse_u32, ["uint", "uint32_t"]);
blend_primitive!(i32, parse_i32, ["int", "int32_t"]);
blend_primitive!(u64, parse_u64, ["uint64_t", "ulong"]);
blend_primitive!(i64, parse_i64, ["int64_t", "long"]);
blend_primitive!(f32, parse_f32, ["float"]);
blend_primitive!(f64, parse_f64, ["double"]);

pub fn parse_u8(slice: &[u8], _endianness: Endianness) -> Option<u8> {
    slice.first().copied()
}

pub fn parse_i8(slice: &[u8], _endianness: Endianness) -> Option<i8> {
    slice.first().map(|&b| b as i8)
}

pub fn parse_u16(slice: &[u8], endianness: Endianness) -> Option<u16> {
    let res = match endianness {
        Endianness::Little => le_u16::<()>(slice),
        Endianness::Big => be_u16::<()>(slice),
    };
    res.ok().map(|(_, val)| val)
}

pub fn parse_i16(slice: &[u8], endianness: Endianness) -> Option<i16> {
    let res = match endianness {
        Endianness::Little => le_i16::<()>(slice),
        Endianness::Big => be_i16::<()>(slice),
    };
    res.ok().map(|(_, val)| val)
}

pub fn parse_u32(slice: &[u8], endianness: Endianness) -> Option<u32> {
    let res = match endianness {
        Endianness::Little => le_u32::<()>(slice),
        Endianness::Big => be_u32::<()>(slice),
    };
    res.ok().map(|(_, val)| val)
}

pub fn parse_i32(slice: &[u8], endianness: Endianness) -> Option<i32> {
    let res = match endianness {
        Endianness::Little => le_i32::<()>(slice),
        Endianness::Big => be_i32::<()>(slice),
    };
    res.ok().map(|(_, val)| val)
}

pub fn parse_u64(slice: &[u8], endianness: Endianness) -> Option<u64> {
    let res = match endianness {
        Endianness::Little => le_u64::<()>(slice),
        Endianness::Big => be_u64::<()>(slice),
    };
    res.ok().map(|(_, val)| val)
}

pub fn parse_i64(slice: &[u8], endianness: Endianness) -> Option<i64> {
    let res = match endianness {
        Endianness::Little => le_i64::<()>(slice),
        Endianness::Big => be_i64::<()>(slice),
    };
    res.ok().map(|(_, val)| val)
}

pub fn parse_f32(slice: &[u8], endianness: Endianness) -> Option<f32> {
    let res = match endianness {
        Endianness::Little => le_f32::<()>(slice),
        Endianness::Big => be_f32::<()>(slice),
    };
    res.ok().map(|(_, val)| val)
}

pub fn parse_f64(slice: &[u8], endianness: Endianness) -> Option<f64> {
    let res = match endianness {
        Endianness::Little => le_f64::<()>(slice),
        Endianness::Big => be_f64::<()>(slice),
    };
    res.ok().map(|(_, val)| val)
}
