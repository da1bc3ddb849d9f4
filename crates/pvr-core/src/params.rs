//! Parameter classification, sizing and typed decoding.
//!
//! The TA stream is a sequence of tagged 32/64 byte parameters. The PCW in
//! the first word picks the command; together with the polygon's color mode,
//! texturing and UV width it also picks one of five global-parameter layouts
//! and eighteen vertex layouts. This module turns raw parameter bytes into
//! the discriminated types the translator consumes, replacing any need to
//! reinterpret byte offsets in place.

use once_cell::sync::Lazy;

use crate::types::*;

const TA_NUM_POLYS: usize = 7;

struct ParamSizes {
    /// Global parameter byte size per polygon type.
    poly: [u8; TA_NUM_POLYS],
    /// Vertex parameter byte size per vertex type.
    vert: [u8; TA_NUM_VERTS as usize],
}

static PARAM_SIZES: Lazy<ParamSizes> = Lazy::new(|| {
    let mut poly = [32u8; TA_NUM_POLYS];
    for t in [2, 4] {
        poly[t] = 64;
    }

    let mut vert = [32u8; TA_NUM_VERTS as usize];
    for t in [5, 6, 11, 12, 13, 14, 15, 16, 17] {
        vert[t] = 64;
    }

    ParamSizes { poly, vert }
});

/// Force the lazily-built parameter tables. Idempotent; called once on
/// entry to a conversion.
pub fn init_tables() {
    Lazy::force(&PARAM_SIZES);
}

/// Polygon type (0..=4 polygon, 5 sprite, 6 modifier volume) selected by a
/// global parameter's PCW.
pub fn poly_type(pcw: PCW) -> u32 {
    if pcw.list_type() == LIST_OPAQUE_MODVOL || pcw.list_type() == LIST_TRANSLUCENT_MODVOL {
        return 6;
    }

    if pcw.para_type() == PARAM_SPRITE {
        return 5;
    }

    if pcw.volume() {
        match pcw.col_type() {
            0 | 3 => return 3,
            2 => return 4,
            // float color is not a two-volume mode; classified as if flat
            _ => {}
        }
    }

    match pcw.col_type() {
        0 | 1 | 3 => 0,
        _ if pcw.texture() && pcw.offset() => 2,
        _ => 1,
    }
}

/// Vertex encoding selected by a global parameter's PCW, valid for every
/// vertex parameter up to the next global parameter.
pub fn vert_type(pcw: PCW) -> u32 {
    if pcw.list_type() == LIST_OPAQUE_MODVOL || pcw.list_type() == LIST_TRANSLUCENT_MODVOL {
        return VERT_MODVOL;
    }

    if pcw.para_type() == PARAM_SPRITE {
        return if pcw.texture() { VERT_TEX_SPRITE } else { VERT_SPRITE };
    }

    let uv16 = pcw.uv_16bit() as u32;

    if pcw.volume() {
        if pcw.texture() {
            match pcw.col_type() {
                0 => return 11 + uv16,
                2 | 3 => return 13 + uv16,
                _ => {}
            }
        } else {
            match pcw.col_type() {
                0 => return 9,
                2 | 3 => return 10,
                _ => {}
            }
        }
    }

    if pcw.texture() {
        return match pcw.col_type() {
            0 => 3 + uv16,
            1 => 5 + uv16,
            _ => 7 + uv16,
        };
    }

    match pcw.col_type() {
        0 => 0,
        1 => 1,
        _ => 2,
    }
}

/// Byte length of the parameter that starts with `pcw`, given the vertex
/// type latched by the most recent global parameter.
pub fn param_size(pcw: PCW, vert_type: u32) -> usize {
    let sizes = &*PARAM_SIZES;

    match pcw.para_type() {
        PARAM_END_OF_LIST | PARAM_USER_TILE_CLIP | PARAM_OBJ_LIST_SET => 32,
        PARAM_POLY_OR_VOL | PARAM_SPRITE => sizes.poly[poly_type(pcw) as usize] as usize,
        PARAM_VERTEX => {
            assert!(
                vert_type < TA_NUM_VERTS,
                "vertex parameter without a preceding global parameter"
            );
            sizes.vert[vert_type as usize] as usize
        }
        other => panic!("unhandled parameter type {other}"),
    }
}

/// The list_type field of a PCW is only meaningful on the first global
/// parameter after an end of list.
pub fn pcw_list_type_valid(pcw: PCW, current_list: u32) -> bool {
    current_list == TA_NUM_LISTS
        && matches!(
            pcw.para_type(),
            PARAM_OBJ_LIST_SET | PARAM_POLY_OR_VOL | PARAM_SPRITE
        )
}

/// One raw parameter viewed as little-endian words. Short parameters leave
/// the upper words zero.
#[derive(Copy, Clone)]
pub struct ParamWords {
    words: [u32; 16],
}

impl ParamWords {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut words = [0u32; 16];
        for (word, chunk) in words.iter_mut().zip(bytes.chunks_exact(4)) {
            *word = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }
        Self { words }
    }

    #[inline(always)]
    pub fn word(&self, idx: usize) -> u32 {
        self.words[idx]
    }

    #[inline(always)]
    pub fn float(&self, idx: usize) -> f32 {
        f32::from_bits(self.words[idx])
    }

    #[inline(always)]
    pub fn pcw(&self) -> PCW {
        PCW(self.words[0])
    }
}

/// Reinterpret the upper half of a 16.0 fixed UV as the high bits of an
/// IEEE-754 single. This is a bit copy, not a numeric conversion.
#[inline]
pub fn f16(v: u16) -> f32 {
    f32::from_bits((v as u32) << 16)
}

/// Split a packed UV word into (u, v). U rides the high half of the word,
/// V the low half.
#[inline]
pub fn uv16(word: u32) -> [f32; 2] {
    [f16((word >> 16) as u16), f16((word & 0xFFFF) as u16)]
}

/// Payload of a global parameter beyond the isp/tsp/tcw header.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum PolyData {
    /// Type 0: no color state.
    Plain,
    /// Type 1: face color, r/g/b/a.
    FaceColor([f32; 4]),
    /// Type 2: face color and face offset color, r/g/b/a each.
    FaceColors { base: [f32; 4], offset: [f32; 4] },
    /// Type 5: packed sprite base and offset colors.
    SpriteColors { base: u32, offset: u32 },
    /// Type 6: modifier volume, parsed for size only.
    ModifierVolume,
}

/// A decoded global parameter.
#[derive(Copy, Clone)]
pub struct PolyParam {
    pub pcw: PCW,
    pub isp: ISP_TSP,
    pub tsp: TSP,
    pub tcw: TCW,
    pub data: PolyData,
}

/// Decode a global parameter. `None` for the two-volume polygon types the
/// translator does not support.
pub fn decode_poly(words: &ParamWords) -> Option<PolyParam> {
    let pcw = words.pcw();

    let data = match poly_type(pcw) {
        0 => PolyData::Plain,
        1 => PolyData::FaceColor(float_color(words, 4)),
        2 => PolyData::FaceColors {
            base: float_color(words, 8),
            offset: float_color(words, 12),
        },
        5 => PolyData::SpriteColors {
            base: words.word(4),
            offset: words.word(5),
        },
        6 => PolyData::ModifierVolume,
        _ => return None,
    };

    Some(PolyParam {
        pcw,
        isp: ISP_TSP(words.word(1)),
        tsp: TSP(words.word(2)),
        tcw: TCW(words.word(3)),
        data,
    })
}

/// A sprite quad as it appears on the wire: three full corners, the fourth
/// only as x/y. Visiting order is a, b, c, d, clockwise.
#[derive(Copy, Clone, Debug)]
pub struct SpriteParam {
    pub xyz: [[f32; 3]; 3],
    pub d_xy: [f32; 2],
    pub uv: [[f32; 2]; 3],
}

/// A decoded vertex parameter. The 16-bit UV encodings widen to floats
/// here, so each pair of wire formats collapses into one variant.
#[derive(Copy, Clone, Debug)]
pub enum VertexData {
    /// Type 0.
    Packed { xyz: [f32; 3], base_color: u32 },
    /// Type 1.
    FloatColor { xyz: [f32; 3], base_color: [f32; 4] },
    /// Type 2.
    Intensity { xyz: [f32; 3], base_intensity: f32 },
    /// Types 3 and 4.
    TexturedPacked {
        xyz: [f32; 3],
        uv: [f32; 2],
        base_color: u32,
        offset_color: u32,
    },
    /// Types 5 and 6.
    TexturedFloat {
        xyz: [f32; 3],
        uv: [f32; 2],
        base_color: [f32; 4],
        offset_color: [f32; 4],
    },
    /// Types 7 and 8.
    TexturedIntensity {
        xyz: [f32; 3],
        uv: [f32; 2],
        base_intensity: f32,
        offset_intensity: f32,
    },
    /// Types 15 and 16.
    Sprite(SpriteParam),
    /// Type 17, parsed for size only.
    ModifierVolume,
}

/// Decode a vertex parameter against the latched vertex type. `None` for
/// the two-volume encodings the translator does not support.
pub fn decode_vertex(words: &ParamWords, vert_type: u32) -> Option<VertexData> {
    let xyz = [words.float(1), words.float(2), words.float(3)];

    let data = match vert_type {
        0 => VertexData::Packed {
            xyz,
            base_color: words.word(6),
        },
        1 => VertexData::FloatColor {
            xyz,
            base_color: float_color(words, 4),
        },
        2 => VertexData::Intensity {
            xyz,
            base_intensity: words.float(6),
        },
        3 => VertexData::TexturedPacked {
            xyz,
            uv: [words.float(4), words.float(5)],
            base_color: words.word(6),
            offset_color: words.word(7),
        },
        4 => VertexData::TexturedPacked {
            xyz,
            uv: uv16(words.word(4)),
            base_color: words.word(6),
            offset_color: words.word(7),
        },
        5 => VertexData::TexturedFloat {
            xyz,
            uv: [words.float(4), words.float(5)],
            base_color: float_color(words, 8),
            offset_color: float_color(words, 12),
        },
        6 => VertexData::TexturedFloat {
            xyz,
            uv: uv16(words.word(4)),
            base_color: float_color(words, 8),
            offset_color: float_color(words, 12),
        },
        7 => VertexData::TexturedIntensity {
            xyz,
            uv: [words.float(4), words.float(5)],
            base_intensity: words.float(6),
            offset_intensity: words.float(7),
        },
        8 => VertexData::TexturedIntensity {
            xyz,
            uv: uv16(words.word(4)),
            base_intensity: words.float(6),
            offset_intensity: words.float(7),
        },
        VERT_SPRITE | VERT_TEX_SPRITE => VertexData::Sprite(SpriteParam {
            xyz: [
                [words.float(1), words.float(2), words.float(3)],
                [words.float(4), words.float(5), words.float(6)],
                [words.float(7), words.float(8), words.float(9)],
            ],
            d_xy: [words.float(10), words.float(11)],
            // word 12 is reserved; untextured sprites leave these zero
            uv: [
                uv16(words.word(13)),
                uv16(words.word(14)),
                uv16(words.word(15)),
            ],
        }),
        VERT_MODVOL => VertexData::ModifierVolume,
        _ => return None,
    };

    Some(data)
}

/// Read an a/r/g/b word quad as r/g/b/a.
fn float_color(words: &ParamWords, base: usize) -> [f32; 4] {
    [
        words.float(base + 1),
        words.float(base + 2),
        words.float(base + 3),
        words.float(base),
    ]
}
