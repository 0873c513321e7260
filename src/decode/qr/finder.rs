//! Finder pattern localization
//!
//! Scans rows for the 1:1:3:1:1 dark/light signature of a QR finder
//! pattern, confirms each hit with a vertical cross-check, and merges
//! repeated detections into candidate centers.

use crate::decode::binarize::BitMatrix;

/// One candidate finder pattern center, in pixel coordinates
#[derive(Debug, Clone, Copy)]
pub(super) struct FinderPattern {
    pub(super) x: f64,
    pub(super) y: f64,
    /// Estimated module size in pixels
    pub(super) module: f64,
    /// Number of scan rows that confirmed this center
    pub(super) hits: usize,
}

/// Check five run lengths against 1:1:3:1:1 and return the module size
fn ratio_check(runs: &[usize; 5]) -> Option<f64> {
    let total: usize = runs.iter().sum();
    if total < 7 {
        return None;
    }
    let unit = total as f64 / 7.0;
    let max_var = unit / 2.0;
    for (i, &run) in runs.iter().enumerate() {
        let expected = if i == 2 { 3.0 * unit } else { unit };
        let tolerance = if i == 2 { 3.0 * max_var } else { max_var };
        if (run as f64 - expected).abs() >= tolerance {
            return None;
        }
    }
    Some(unit)
}

/// Walk vertically from (x, y) and extract the crossing 1:1:3:1:1
/// profile; returns the refined center y and module size.
fn cross_check_vertical(matrix: &BitMatrix, x: usize, y: usize) -> Option<(f64, f64)> {
    if !matrix.get(x, y) {
        return None;
    }
    let h = matrix.height();

    let run_up = |mut yy: i64, want: bool| -> usize {
        let mut count = 0;
        while yy >= 0 && matrix.get(x, yy as usize) == want {
            count += 1;
            yy -= 1;
        }
        count
    };
    let run_down = |mut yy: usize, want: bool| -> usize {
        let mut count = 0;
        while yy < h && matrix.get(x, yy) == want {
            count += 1;
            yy += 1;
        }
        count
    };

    let mid_up = run_up(y as i64, true);
    let light_up = run_up(y as i64 - mid_up as i64, false);
    let dark_up = run_up(y as i64 - (mid_up + light_up) as i64, true);
    let mid_down = run_down(y + 1, true);
    let light_down = run_down(y + 1 + mid_down, false);
    let dark_down = run_down(y + 1 + mid_down + light_down, true);

    let profile = [
        dark_up,
        light_up,
        mid_up + mid_down,
        light_down,
        dark_down,
    ];
    let module = ratio_check(&profile)?;

    let top = y as f64 - mid_up as f64 + 1.0;
    let center_y = top + profile[2] as f64 / 2.0 - 0.5;
    Some((center_y, module))
}

/// Same profile walk along the row, used to refine x after the vertical
/// confirmation.
fn cross_check_horizontal(matrix: &BitMatrix, x: usize, y: usize) -> Option<(f64, f64)> {
    if !matrix.get(x, y) {
        return None;
    }
    let w = matrix.width();

    let run_left = |mut xx: i64, want: bool| -> usize {
        let mut count = 0;
        while xx >= 0 && matrix.get(xx as usize, y) == want {
            count += 1;
            xx -= 1;
        }
        count
    };
    let run_right = |mut xx: usize, want: bool| -> usize {
        let mut count = 0;
        while xx < w && matrix.get(xx, y) == want {
            count += 1;
            xx += 1;
        }
        count
    };

    let mid_left = run_left(x as i64, true);
    let light_left = run_left(x as i64 - mid_left as i64, false);
    let dark_left = run_left(x as i64 - (mid_left + light_left) as i64, true);
    let mid_right = run_right(x + 1, true);
    let light_right = run_right(x + 1 + mid_right, false);
    let dark_right = run_right(x + 1 + mid_right + light_right, true);

    let profile = [
        dark_left,
        light_left,
        mid_left + mid_right,
        light_right,
        dark_right,
    ];
    let module = ratio_check(&profile)?;

    let left = x as f64 - mid_left as f64 + 1.0;
    let center_x = left + profile[2] as f64 / 2.0 - 0.5;
    Some((center_x, module))
}

/// Locate finder pattern candidates across the whole image
pub(super) fn find(matrix: &BitMatrix) -> Vec<FinderPattern> {
    let mut candidates: Vec<FinderPattern> = Vec::new();

    for y in 0..matrix.height() {
        let row = matrix.row(y);
        let (runs, first_dark) = crate::decode::one_d::row_runs(row);
        if runs.len() < 5 {
            continue;
        }
        let mut offset = 0usize;
        for i in 0..runs.len() {
            let start = offset;
            offset += runs[i];
            let run_is_dark = (i % 2 == 0) == first_dark;
            if !run_is_dark || i + 5 > runs.len() {
                continue;
            }
            let window = [runs[i], runs[i + 1], runs[i + 2], runs[i + 3], runs[i + 4]];
            if ratio_check(&window).is_none() {
                continue;
            }
            // Center of the wide middle run
            let cx = start + runs[i] + runs[i + 1] + runs[i + 2] / 2;
            let Some((center_y, v_module)) = cross_check_vertical(matrix, cx, y) else {
                continue;
            };
            let Some((center_x, h_module)) =
                cross_check_horizontal(matrix, cx, center_y.round() as usize)
            else {
                continue;
            };
            let module = (v_module + h_module) / 2.0;
            merge(&mut candidates, center_x, center_y, module);
        }
    }

    candidates
}

fn merge(candidates: &mut Vec<FinderPattern>, x: f64, y: f64, module: f64) {
    for c in candidates.iter_mut() {
        if (c.x - x).abs() <= c.module * 2.0 && (c.y - y).abs() <= c.module * 2.0 {
            let n = c.hits as f64;
            c.x = (c.x * n + x) / (n + 1.0);
            c.y = (c.y * n + y) / (n + 1.0);
            c.module = (c.module * n + module) / (n + 1.0);
            c.hits += 1;
            return;
        }
    }
    candidates.push(FinderPattern {
        x,
        y,
        module,
        hits: 1,
    });
}
