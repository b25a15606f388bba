#![doc = r#"
Sprite evaluation for the next scanline.

Dots 1-64 fill secondary OAM with $FF (one byte per two dots). Dots 65-256
walk primary OAM: odd dots read a byte into the OAM latch, even dots act on it.

```text
Scan      copy Y; if in range copy tile/attr/X (m = 1..3), then n += 1
          after 8 sprites -> Overflow
Overflow  treat OAM[n*4 + m] as a Y coordinate
          hit  -> set the overflow flag, stop
          miss -> n += 1 and m += 1 (no carry from m into n)
Done      idle until dot 257
```
The scan starts at sprite OAMADDR / 4, so a non-zero OAMADDR when rendering
begins skips the sprites before it. Whichever sprite is examined first takes
the sprite-0 role for the hit test.
The `m` increment on a miss is the hardware bug: after eight sprites the
scan drifts diagonally through OAM and reads tile, attribute or X bytes as Y,
which gives both false positives and false negatives.
"#]

use tracing::trace;

use super::{PRE_RENDER_LINE, Ppu, PpuStatus};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum EvalState {
    #[default]
    Scan,
    Overflow,
    Done,
}

#[derive(Debug, Clone, Copy, Default)]
pub(in crate::ppu) struct SpriteEval {
    state: EvalState,
    first: u8,
    n: u8,
    m: u8,
    latch: u8,
    /// Sprites copied to secondary OAM this line.
    pub(in crate::ppu) found: u8,
    /// The first sprite examined is among them (it can only land in slot 0).
    pub(in crate::ppu) sprite_zero: bool,
}

impl SpriteEval {
    fn starting_at(oam_addr: u8) -> Self {
        let n = oam_addr >> 2;
        Self {
            first: n,
            n,
            ..Self::default()
        }
    }

    fn oam_index(&self) -> usize {
        (usize::from(self.n) * 4 + usize::from(self.m)) & 0xFF
    }

    fn next_sprite(&mut self) {
        self.n += 1;
        if self.n == 64 {
            self.n = 0;
            self.state = EvalState::Done;
        }
    }
}

fn in_range(line: i16, y: u8, height: i16) -> bool {
    (0..height).contains(&(line - i16::from(y)))
}

impl Ppu {
    /// Dots 1-64.
    pub(in crate::ppu) fn clear_secondary_phase(&mut self, sx: u16) {
        if sx % 2 == 0 {
            self.secondary[usize::from((sx - 1) / 2)] = 0xFF;
        }
    }

    /// Dots 65-256.
    pub(in crate::ppu) fn evaluate_phase(&mut self, sy: u16, sx: u16) {
        if sx == 65 {
            self.eval = SpriteEval::starting_at(self.oam_addr);
        }
        if sx % 2 == 1 {
            self.eval.latch = self.oam[self.eval.oam_index()];
            return;
        }

        // Nothing on the pre-render line is in range of the line before 0.
        let line = if sy == PRE_RENDER_LINE { -1 } else { sy as i16 };
        let height = self.ctrl.sprite_height() as i16;
        let eval = &mut self.eval;
        let latch = eval.latch;

        match eval.state {
            EvalState::Scan => {
                let slot = usize::from(eval.found) * 4 + usize::from(eval.m);
                self.secondary[slot] = latch;
                if eval.m == 0 {
                    if in_range(line, latch, height) {
                        eval.sprite_zero |= eval.n == eval.first;
                        eval.m = 1;
                    } else {
                        eval.next_sprite();
                    }
                } else {
                    eval.m += 1;
                    if eval.m == 4 {
                        eval.m = 0;
                        eval.found += 1;
                        eval.next_sprite();
                        if eval.state == EvalState::Scan && eval.found == 8 {
                            eval.state = EvalState::Overflow;
                        }
                    }
                }
            }
            EvalState::Overflow => {
                if in_range(line, latch, height) {
                    self.status.insert(PpuStatus::SPRITE_OVERFLOW);
                    trace!(scanline = sy, n = eval.n, m = eval.m, "sprite overflow");
                    eval.state = EvalState::Done;
                } else {
                    eval.m = (eval.m + 1) & 0x03;
                    eval.next_sprite();
                }
            }
            EvalState::Done => {}
        }
    }
}
