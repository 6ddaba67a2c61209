//! Myers shortest-edit-script line diff
//!
//! `diff(a, b)` produces a tagged line sequence: keeping the `' '` and
//! `'-'` lines reproduces `a`, keeping the `' '` and `'+'` lines
//! reproduces `b`. the output is deterministic for identical inputs.

use std::fmt;

/// how a line relates to the two inputs
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DiffTag {
    /// present in both inputs
    Common,
    /// present only in the left input
    Removed,
    /// present only in the right input
    Added,
}

impl DiffTag {
    pub fn symbol(&self) -> char {
        match self {
            DiffTag::Common => ' ',
            DiffTag::Removed => '-',
            DiffTag::Added => '+',
        }
    }
}

/// one line of an edit script
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiffLine {
    pub tag: DiffTag,
    pub text: String,
}

impl DiffLine {
    fn new(tag: DiffTag, text: &str) -> Self {
        Self {
            tag,
            text: text.to_string(),
        }
    }
}

impl fmt::Display for DiffLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.tag.symbol(), self.text)
    }
}

/// compute the shortest edit script between two line sequences
///
/// the forward pass records the furthest-reaching endpoints (the V array)
/// for each edit distance D; the backtrack replays the trace using the same
/// diagonal tie-break as the forward pass, so the script is canonical.
pub fn diff(a: &[String], b: &[String]) -> Vec<DiffLine> {
    let n = a.len();
    let m = b.len();
    let max = n + m;
    if max == 0 {
        return Vec::new();
    }

    // diagonals k in [-d, d] are stored at index k + max
    let mut v = vec![0usize; 2 * max + 1];
    let mut trace: Vec<Vec<usize>> = Vec::new();
    let mut end_k = 0;
    let mut done = false;

    for d in 0..=max {
        let mut k = max - d;
        loop {
            let mut x = if k == max - d || (k != max + d && v[k - 1] < v[k + 1]) {
                v[k + 1]
            } else {
                v[k - 1] + 1
            };
            let mut y = x + max - k;
            while x < n && y < m && a[x] == b[y] {
                x += 1;
                y += 1;
            }
            v[k] = x;
            if x >= n && y >= m {
                end_k = k;
                done = true;
                break;
            }
            if k == max + d {
                break;
            }
            k += 2;
        }
        trace.push(v.clone());
        if done {
            break;
        }
    }

    // backtrack from (n, m); odd/even diagonal parity means the values for
    // k +/- 1 in trace[d] are still those of round d - 1
    let mut lines = Vec::new();
    let mut k = end_k;
    let mut x = n;
    for d in (1..trace.len()).rev() {
        let vd = &trace[d];
        x = vd[k];
        let mut y = x + max - k;
        let prev_k = if k == max - d || (k != max + d && vd[k - 1] < vd[k + 1]) {
            k + 1
        } else {
            k - 1
        };
        let prev_x = vd[prev_k];
        let prev_y = prev_x + max - prev_k;

        while x > prev_x && y > prev_y {
            x -= 1;
            y -= 1;
            lines.push(DiffLine::new(DiffTag::Common, &a[x]));
        }
        if x > prev_x {
            x -= 1;
            lines.push(DiffLine::new(DiffTag::Removed, &a[x]));
        } else if y > prev_y {
            lines.push(DiffLine::new(DiffTag::Added, &b[prev_y]));
        }
        k = prev_k;
    }

    // whatever remains sits on the middle diagonal: a common prefix
    while x > 0 {
        x -= 1;
        lines.push(DiffLine::new(DiffTag::Common, &a[x]));
    }

    lines.reverse();
    lines
}
