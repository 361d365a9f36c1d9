//! CPU pixel operations on RGBA8 buffers.

use image::{Rgba, RgbaImage};

use super::{AlphaMode, BlitParams, Filter};
use crate::batch::BlendMode;
use crate::coords::PixelRect;
use crate::paint::QuadGradient;

#[inline]
fn mul_u8(a: u8, b: u8) -> u8 {
    ((a as u32 * b as u32 + 127) / 255) as u8
}

/// Multiplies a texel by a tint. An opaque white tint is the exact identity.
#[inline]
pub fn modulate(texel: [u8; 4], tint: [u8; 4]) -> [u8; 4] {
    [
        mul_u8(texel[0], tint[0]),
        mul_u8(texel[1], tint[1]),
        mul_u8(texel[2], tint[2]),
        mul_u8(texel[3], tint[3]),
    ]
}

#[inline]
fn premultiply(px: [u8; 4]) -> [u8; 4] {
    let a = px[3];
    [mul_u8(px[0], a), mul_u8(px[1], a), mul_u8(px[2], a), a]
}

/// Composites straight-alpha `src` onto `dst`.
pub fn blend_pixel(dst: &mut [u8; 4], src: [u8; 4], mode: BlendMode, alpha: AlphaMode) {
    let src = match alpha {
        AlphaMode::Straight => src,
        AlphaMode::Premultiplied => premultiply(src),
    };

    match mode {
        BlendMode::Opaque => *dst = src,
        BlendMode::Multiply => *dst = modulate(*dst, src),
        BlendMode::Blend => {
            if src[3] == 255 {
                *dst = src;
                return;
            }
            if src[3] == 0 {
                return;
            }
            let sa = src[3] as f32 / 255.0;
            let inv = 1.0 - sa;
            match alpha {
                AlphaMode::Premultiplied => {
                    for c in 0..4 {
                        dst[c] = (src[c] as f32 + dst[c] as f32 * inv).round().min(255.0) as u8;
                    }
                }
                AlphaMode::Straight => {
                    let da = dst[3] as f32 / 255.0;
                    let oa = sa + da * inv;
                    for c in 0..3 {
                        let v = (src[c] as f32 * sa + dst[c] as f32 * da * inv) / oa;
                        dst[c] = v.round().clamp(0.0, 255.0) as u8;
                    }
                    dst[3] = (oa * 255.0).round() as u8;
                }
            }
        }
    }
}

/// Fills `dest` (clipped to `target`) with an interpolated color.
pub(crate) fn fill(
    target: &mut RgbaImage,
    dest: PixelRect,
    paint: &QuadGradient,
    blend: BlendMode,
    alpha: AlphaMode,
) {
    let Some(clip) = dest.clip_to(target.width(), target.height()) else { return };
    let uniform = paint.is_uniform().then(|| paint.c0.to_rgba8());

    for y in clip.y..clip.bottom() {
        for x in clip.x..clip.right() {
            let src = match uniform {
                Some(c) => c,
                None => paint.pixel_rgba8(x - dest.x, y - dest.y, dest.width, dest.height),
            };
            let px = target.get_pixel_mut(x as u32, y as u32);
            blend_pixel(&mut px.0, src, blend, alpha);
        }
    }
}

/// Overwrites every pixel of `target` with `rgba`.
pub(crate) fn fill_solid(target: &mut RgbaImage, rgba: [u8; 4]) {
    for px in bytemuck::cast_slice_mut::<u8, [u8; 4]>(&mut **target) {
        *px = rgba;
    }
}

/// Copies `image` into `target` at `(x, y)`, replacing existing pixels.
pub(crate) fn write_region(target: &mut RgbaImage, image: &RgbaImage, x: i32, y: i32) {
    image::imageops::replace(target, image, x as i64, y as i64);
}

/// Draws `src` of `image` scaled into `dest` of `target`.
///
/// Destination pixels whose sample falls outside `image` are left untouched.
pub(crate) fn blit(
    target: &mut RgbaImage,
    image: &RgbaImage,
    src: PixelRect,
    dest: PixelRect,
    params: &BlitParams,
    alpha: AlphaMode,
) {
    if src.is_empty() || dest.is_empty() {
        return;
    }
    let Some(readable) = src.clip_to(image.width(), image.height()) else { return };
    let Some(clip) = dest.clip_to(target.width(), target.height()) else { return };

    let sx_scale = src.width as f32 / dest.width as f32;
    let sy_scale = src.height as f32 / dest.height as f32;
    let identity_tint = params.tint.is_identity_tint();

    for y in clip.y..clip.bottom() {
        let j = y - dest.y;
        let sy = src.y as f32 + (j as f32 + 0.5) * sy_scale;
        for x in clip.x..clip.right() {
            let i = x - dest.x;
            let sx = src.x as f32 + (i as f32 + 0.5) * sx_scale;

            let texel = match params.filter {
                Filter::Nearest => sample_nearest(image, readable, sx, sy),
                Filter::Bilinear => sample_bilinear(image, readable, sx, sy),
            };
            let Some(mut texel) = texel else { continue };

            if !identity_tint {
                texel = modulate(texel, params.tint.pixel_rgba8(i, j, dest.width, dest.height));
            }
            let px = target.get_pixel_mut(x as u32, y as u32);
            blend_pixel(&mut px.0, texel, params.blend, alpha);
        }
    }
}

#[inline]
fn sample_nearest(image: &RgbaImage, bounds: PixelRect, sx: f32, sy: f32) -> Option<[u8; 4]> {
    let x = sx.floor() as i32;
    let y = sy.floor() as i32;
    if x < bounds.x || y < bounds.y || x >= bounds.right() || y >= bounds.bottom() {
        return None;
    }
    Some(image.get_pixel(x as u32, y as u32).0)
}

fn sample_bilinear(image: &RgbaImage, bounds: PixelRect, sx: f32, sy: f32) -> Option<[u8; 4]> {
    if sx < bounds.x as f32
        || sy < bounds.y as f32
        || sx > bounds.right() as f32
        || sy > bounds.bottom() as f32
    {
        return None;
    }
    // Texel centers sit at +0.5; clamp the footprint to the readable region.
    let fx = sx - 0.5;
    let fy = sy - 0.5;
    let x0 = (fx.floor() as i32).clamp(bounds.x, bounds.right() - 1);
    let y0 = (fy.floor() as i32).clamp(bounds.y, bounds.bottom() - 1);
    let x1 = (x0 + 1).min(bounds.right() - 1);
    let y1 = (y0 + 1).min(bounds.bottom() - 1);
    let tx = (fx - x0 as f32).clamp(0.0, 1.0);
    let ty = (fy - y0 as f32).clamp(0.0, 1.0);

    let p = |x: i32, y: i32| -> Rgba<u8> { *image.get_pixel(x as u32, y as u32) };
    let (a, b, c, d) = (p(x0, y0), p(x1, y0), p(x0, y1), p(x1, y1));

    let mut out = [0u8; 4];
    for ch in 0..4 {
        let top = a.0[ch] as f32 + (b.0[ch] as f32 - a.0[ch] as f32) * tx;
        let bottom = c.0[ch] as f32 + (d.0[ch] as f32 - c.0[ch] as f32) * tx;
        out[ch] = (top + (bottom - top) * ty).round().clamp(0.0, 255.0) as u8;
    }
    Some(out)
}
