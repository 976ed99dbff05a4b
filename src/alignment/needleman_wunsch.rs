/// One column of a pairwise alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlignStep {
    /// `a[i]` and `b[j]` share a column (match or substitution).
    Pair(usize, usize),
    /// `a[i]` against a gap in `b`.
    OnlyA(usize),
    /// `b[j]` against a gap in `a`.
    OnlyB(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairwiseAlignment {
    pub steps: Vec<AlignStep>,
    pub score: i32,
    pub gap_count: u32,
}

const STEP_PAIR: u8 = 0;
const STEP_ONLY_A: u8 = 1;
const STEP_ONLY_B: u8 = 2;

/// Running DP value. Higher score wins; equal scores prefer fewer gaps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Cell {
    score: i32,
    gaps: u32,
}

impl Cell {
    const ORIGIN: Cell = Cell { score: 0, gaps: 0 };

    #[inline(always)]
    fn beats(self, other: Cell) -> bool {
        self.score > other.score || (self.score == other.score && self.gaps < other.gaps)
    }

    #[inline(always)]
    fn gap(self, gap_score: i32) -> Cell {
        Cell {
            score: self.score.saturating_add(gap_score),
            gaps: self.gaps.saturating_add(1),
        }
    }

    #[inline(always)]
    fn pair(self, substitution: i32) -> Cell {
        Cell {
            score: self.score.saturating_add(substitution),
            gaps: self.gaps,
        }
    }

    fn leading_gaps(count: usize, gap_score: i32) -> Cell {
        Cell {
            score: gap_score.saturating_mul(i32::try_from(count).unwrap_or(i32::MAX)),
            gaps: u32::try_from(count).unwrap_or(u32::MAX),
        }
    }
}

/// Global (end-to-end) alignment of two sequences of lengths `a_len` and `b_len`.
///
/// `substitution(i, j)` scores putting `a[i]` and `b[j]` in one column; every
/// gap costs `gap_score`. Among optimal alignments the one with the fewest
/// gaps is returned, and among those the one whose gaps sit latest.
///
/// Memory is one backpointer byte per DP cell plus two score rows.
pub fn global_align<F>(a_len: usize, b_len: usize, gap_score: i32, mut substitution: F) -> PairwiseAlignment
where
    F: FnMut(usize, usize) -> i32,
{
    let width = b_len + 1;
    let mut prev: Vec<Cell> = (0..width)
        .map(|j| Cell::leading_gaps(j, gap_score))
        .collect();
    let mut curr = vec![Cell::ORIGIN; width];
    let mut bp = vec![STEP_PAIR; (a_len + 1) * width];
    for step in bp.iter_mut().take(width).skip(1) {
        *step = STEP_ONLY_B;
    }

    for i in 1..=a_len {
        let row = i * width;
        curr[0] = Cell::leading_gaps(i, gap_score);
        bp[row] = STEP_ONLY_A;
        for j in 1..width {
            let (best, step) = best_transition(
                prev[j],
                curr[j - 1],
                prev[j - 1],
                gap_score,
                substitution(i - 1, j - 1),
            );
            curr[j] = best;
            bp[row + j] = step;
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    let last = prev[b_len];
    let mut steps = Vec::with_capacity(a_len + b_len);
    let (mut i, mut j) = (a_len, b_len);
    while i > 0 || j > 0 {
        match bp[i * width + j] {
            STEP_ONLY_A => {
                i -= 1;
                steps.push(AlignStep::OnlyA(i));
            }
            STEP_ONLY_B => {
                j -= 1;
                steps.push(AlignStep::OnlyB(j));
            }
            _ => {
                debug_assert!(i > 0 && j > 0);
                i -= 1;
                j -= 1;
                steps.push(AlignStep::Pair(i, j));
            }
        }
    }
    steps.reverse();

    PairwiseAlignment {
        steps,
        score: last.score,
        gap_count: last.gaps,
    }
}

/// Picks the predecessor of one cell. Candidates are tried gap-first so that,
/// on a full tie, the gap lands at the later column during traceback.
#[inline(always)]
fn best_transition(up: Cell, left: Cell, diag: Cell, gap_score: i32, substitution: i32) -> (Cell, u8) {
    let mut best = up.gap(gap_score);
    let mut step = STEP_ONLY_A;

    let cand = left.gap(gap_score);
    if cand.beats(best) {
        best = cand;
        step = STEP_ONLY_B;
    }

    let cand = diag.pair(substitution);
    if cand.beats(best) {
        best = cand;
        step = STEP_PAIR;
    }

    (best, step)
}
