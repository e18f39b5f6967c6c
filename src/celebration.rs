use rand::seq::SliceRandom;
use rand::Rng;

const PIECE_COUNT: usize = 60;
const GRAVITY: f64 = 6.0; // rows per second squared
const SYMBOLS: [char; 6] = ['*', '+', '•', '◆', '▪', '✦'];
const PALETTE_SIZE: usize = 6;

/// One falling piece of confetti, in terminal cell coordinates
#[derive(Debug, Clone)]
pub struct ConfettiPiece {
    pub x: f64,
    pub y: f64,
    pub vel_x: f64,
    pub vel_y: f64,
    pub symbol: char,
    pub color_index: usize,
}

impl ConfettiPiece {
    fn random<R: Rng + ?Sized>(width: f64, rng: &mut R) -> Self {
        Self {
            x: rng.gen_range(0.0..width.max(1.0)),
            // start above the visible area so the burst rains in
            y: -rng.gen_range(1.0..10.0),
            vel_x: rng.gen_range(-1.5..1.5),
            vel_y: rng.gen_range(4.0..8.0),
            symbol: *SYMBOLS.choose(rng).unwrap_or(&'*'),
            color_index: rng.gen_range(0..PALETTE_SIZE),
        }
    }

    fn update(&mut self, dt: f64) {
        self.x += self.vel_x * dt;
        self.y += self.vel_y * dt;
        self.vel_y += GRAVITY * dt;
    }
}

/// Confetti shower shown over the results overlay on a new personal best.
/// Runs until every piece has fallen past the bottom edge.
#[derive(Debug)]
pub struct Confetti {
    pub pieces: Vec<ConfettiPiece>,
    pub is_active: bool,
    pub width: f64,
    pub height: f64,
}

impl Confetti {
    pub fn new() -> Self {
        Self {
            pieces: Vec::new(),
            is_active: false,
            width: 80.0,
            height: 24.0,
        }
    }

    pub fn start(&mut self, width: u16, height: u16) {
        self.start_with(width, height, &mut rand::thread_rng());
    }

    pub fn start_with<R: Rng + ?Sized>(&mut self, width: u16, height: u16, rng: &mut R) {
        self.width = width as f64;
        self.height = height as f64;
        let span = self.width;
        self.pieces = (0..PIECE_COUNT)
            .map(|_| ConfettiPiece::random(span, &mut *rng))
            .collect();
        self.is_active = true;
    }

    pub fn stop(&mut self) {
        self.pieces.clear();
        self.is_active = false;
    }

    /// Advance by `dt` seconds and drop pieces that left the screen
    pub fn update(&mut self, dt: f64) {
        if !self.is_active {
            return;
        }

        let floor = self.height + 2.0;
        self.pieces.retain_mut(|piece| {
            piece.update(dt);
            piece.y <= floor
        });

        if self.pieces.is_empty() {
            self.is_active = false;
        }
    }
}

impl Default for Confetti {
    fn default() -> Self {
        Self::new()
    }
}
