use crate::{
    effects::transitions::{TransitionKind, WipeDir},
    foundation::error::{AdreelError, AdreelResult},
    foundation::math::{mul_div255_u8, unit_to_u8},
};

/// One RGBA8 pixel. Output frames are opaque, so straight and premultiplied agree.
pub type Rgba8 = [u8; 4];

/// Linear blend `a*(1-t) + b*t`, with `t` quantized to 8 bits.
pub fn crossfade(a: Rgba8, b: Rgba8, t: f32) -> Rgba8 {
    let tt = u16::from(unit_to_u8(t));
    let it = 255u16 - tt;

    let mut out = [0u8; 4];
    for i in 0..4 {
        let av = mul_div255_u8(u16::from(a[i]), it);
        let bv = mul_div255_u8(u16::from(b[i]), tt);
        out[i] = av.saturating_add(bv);
    }
    out
}

/// Crossfade two equal-size RGBA8 buffers into `dst`.
pub fn crossfade_into(dst: &mut [u8], a: &[u8], b: &[u8], t: f32) -> AdreelResult<()> {
    if dst.len() != a.len() || dst.len() != b.len() || !dst.len().is_multiple_of(4) {
        return Err(AdreelError::media_shape(
            "crossfade expects equal-length rgba8 buffers",
        ));
    }
    for ((d, a), b) in dst
        .chunks_exact_mut(4)
        .zip(a.chunks_exact(4))
        .zip(b.chunks_exact(4))
    {
        let out = crossfade([a[0], a[1], a[2], a[3]], [b[0], b[1], b[2], b[3]], t);
        d.copy_from_slice(&out);
    }
    Ok(())
}

/// Geometry and progress of one wipe frame.
#[derive(Clone, Copy, Debug)]
pub struct WipeParams {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Progress in `[0, 1]`; 0 shows `a`, 1 shows `b`.
    pub t: f32,
    /// Reveal direction of `b`.
    pub dir: WipeDir,
    /// Soft edge width as a fraction of the axis length.
    pub soft_edge: f32,
}

/// Reveal `b` over `a` along `params.dir`, returning a new buffer.
pub fn wipe(a: &[u8], b: &[u8], params: WipeParams) -> AdreelResult<Vec<u8>> {
    let WipeParams {
        width,
        height,
        t,
        dir,
        soft_edge,
    } = params;
    let len = (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(4));
    if len != Some(a.len()) || a.len() != b.len() {
        return Err(AdreelError::media_shape(format!(
            "wipe expects two {width}x{height} rgba8 buffers"
        )));
    }
    if a.is_empty() {
        return Ok(Vec::new());
    }

    let horizontal = matches!(dir, WipeDir::LeftToRight | WipeDir::RightToLeft);
    let mut ramp = reveal_ramp(if horizontal { width } else { height }, t, soft_edge);
    if matches!(dir, WipeDir::RightToLeft | WipeDir::BottomToTop) {
        ramp.reverse();
    }

    let stride = width as usize * 4;
    let mut out = Vec::with_capacity(a.len());
    for (y, (row_a, row_b)) in a.chunks_exact(stride).zip(b.chunks_exact(stride)).enumerate() {
        for (x, (pa, pb)) in row_a.chunks_exact(4).zip(row_b.chunks_exact(4)).enumerate() {
            let shown = if horizontal { ramp[x] } else { ramp[y] };
            out.extend_from_slice(&crossfade(
                [pa[0], pa[1], pa[2], pa[3]],
                [pb[0], pb[1], pb[2], pb[3]],
                shown,
            ));
        }
    }
    Ok(out)
}

/// Share of `b` at each position along the wipe axis, leading edge first.
///
/// The front travels from `-soft` to `len + soft` so both endpoints are clean frames.
fn reveal_ramp(len: u32, t: f32, soft_edge: f32) -> Vec<f32> {
    let span = len as f32;
    let soft = soft_edge.max(0.0) * span;
    let front = t.clamp(0.0, 1.0) * (span + 2.0 * soft) - soft;
    (0..len)
        .map(|pos| {
            let pos = pos as f32;
            if soft > 0.0 {
                1.0 - smoothstep(front - soft, front + soft, pos)
            } else if pos < front {
                1.0
            } else {
                0.0
            }
        })
        .collect()
}

/// Produce one transition frame between `a` (outgoing) and `b` (incoming) at progress `t`.
pub fn blend_transition(
    kind: &TransitionKind,
    a: &[u8],
    b: &[u8],
    width: u32,
    height: u32,
    t: f32,
) -> AdreelResult<Vec<u8>> {
    if a.len() != b.len() {
        return Err(AdreelError::media_shape(format!(
            "transition endpoints differ in size ({} vs {} bytes)",
            a.len(),
            b.len()
        )));
    }
    match kind {
        TransitionKind::Cut => {
            let shown = if t < 1.0 { a } else { b };
            Ok(shown.to_vec())
        }
        TransitionKind::Crossfade => {
            let mut dst = vec![0u8; a.len()];
            crossfade_into(&mut dst, a, b, t)?;
            Ok(dst)
        }
        TransitionKind::Wipe { dir, soft_edge } => wipe(
            a,
            b,
            WipeParams {
                width,
                height,
                t,
                dir: *dir,
                soft_edge: *soft_edge,
            },
        ),
    }
}

fn smoothstep(a: f32, b: f32, x: f32) -> f32 {
    if x <= a {
        return 0.0;
    }
    if x >= b {
        return 1.0;
    }
    let t = (x - a) / (b - a);
    (t * t * (3.0 - 2.0 * t)).clamp(0.0, 1.0)
}

#[cfg(test)]
#[path = "../../tests/unit/render/composite.rs"]
mod tests;
