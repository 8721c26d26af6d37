//! Allocation of a scarce supply across competing requests.

/// Sorted-order scratch reused across calls.
#[derive(Debug, Default)]
pub struct Allocator {
    order: Vec<usize>,
    requests: Vec<f64>,
}

impl Allocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Water-fill `supply` over `requests` into `out`.
    ///
    /// Requests are visited in stable ascending order. Each gets its full
    /// amount while that fits in an equal split of the remaining supply;
    /// the first that does not, and every larger one, get the equal split.
    /// Non-finite or negative values count as zero.
    pub fn water_fill(&mut self, requests: &[f64], supply: f64, out: &mut Vec<f64>) {
        self.prepare(requests, false);
        out.clear();
        out.resize(requests.len(), 0.0);

        let mut remaining = sanitize(supply);
        let n = self.order.len();
        for k in 0..n {
            if remaining <= 0.0 {
                break;
            }
            let i = self.order[k];
            let share = remaining / (n - k) as f64;
            if self.requests[i] <= share {
                out[i] = self.requests[i];
                remaining -= self.requests[i];
            } else {
                for &j in &self.order[k..] {
                    out[j] = share;
                }
                break;
            }
        }
    }

    /// Hand out `supply` greedily, largest request first when `largest_first`,
    /// otherwise smallest first. Each request is filled as far as supply lasts.
    pub fn greedy_fill(&mut self, requests: &[f64], supply: f64, largest_first: bool, out: &mut Vec<f64>) {
        self.prepare(requests, largest_first);
        out.clear();
        out.resize(requests.len(), 0.0);

        let mut remaining = sanitize(supply);
        for &i in &self.order {
            if remaining <= 0.0 {
                break;
            }
            let given = self.requests[i].min(remaining);
            out[i] = given;
            remaining -= given;
        }
    }

    fn prepare(&mut self, requests: &[f64], descending: bool) {
        self.requests.clear();
        self.requests.extend(requests.iter().map(|&r| sanitize(r)));
        self.order.clear();
        self.order.extend(0..requests.len());
        let values = &self.requests;
        if descending {
            self.order.sort_by(|&a, &b| values[b].total_cmp(&values[a]));
        } else {
            self.order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));
        }
    }
}

/// One-shot water-fill.
pub fn water_fill(requests: &[f64], supply: f64) -> Vec<f64> {
    let mut out = Vec::with_capacity(requests.len());
    Allocator::new().water_fill(requests, supply, &mut out);
    out
}

fn sanitize(x: f64) -> f64 {
    if x.is_finite() && x > 0.0 {
        x
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: &[f64], expected: &[f64]) {
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < 1e-9, "{actual:?} != {expected:?}");
        }
    }

    #[test]
    fn equal_requests_split_evenly() {
        assert_close(&water_fill(&[50.0, 50.0], 60.0), &[30.0, 30.0]);
    }

    #[test]
    fn small_request_fully_satisfied_first() {
        assert_close(&water_fill(&[10.0, 50.0], 60.0), &[10.0, 50.0]);
        assert_close(&water_fill(&[50.0, 10.0, 40.0], 60.0), &[25.0, 10.0, 25.0]);
    }

    #[test]
    fn surplus_leaves_requests_exact() {
        assert_close(&water_fill(&[1.0, 2.0, 3.0], 100.0), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn degenerate_inputs() {
        assert!(water_fill(&[], 10.0).is_empty());
        assert_close(&water_fill(&[5.0, 5.0], 0.0), &[0.0, 0.0]);
        assert_close(&water_fill(&[f64::NAN, 4.0, -3.0], 10.0), &[0.0, 4.0, 0.0]);
        assert_close(&water_fill(&[4.0], f64::INFINITY), &[0.0]);
    }

    #[test]
    fn never_exceeds_supply_or_request() {
        let requests = [3.0, 17.5, 0.25, 9.0, 9.0, 40.0];
        for supply in [0.0, 1.0, 10.0, 30.0, 60.0, 200.0] {
            let out = water_fill(&requests, supply);
            let total: f64 = out.iter().sum();
            assert!(total <= supply + 1e-9);
            for (o, r) in out.iter().zip(&requests) {
                assert!(*o <= r + 1e-12);
            }
        }
    }

    #[test]
    fn greedy_orders() {
        let mut alloc = Allocator::new();
        let mut out = Vec::new();
        alloc.greedy_fill(&[10.0, 50.0, 20.0], 55.0, true, &mut out);
        assert_close(&out, &[0.0, 50.0, 5.0]);
        alloc.greedy_fill(&[10.0, 50.0, 20.0], 55.0, false, &mut out);
        assert_close(&out, &[10.0, 25.0, 20.0]);
    }
}
