use rusqlite::Connection;
use rust_decimal::{Decimal, RoundingStrategy};

/// Shown wherever an average cannot be computed.
pub const NOT_AVAILABLE: &str = "N/A";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightedGrade {
    pub value: Decimal,
    pub coefficient: i64,
}

/// `Σ(value·coefficient) / Σ(coefficient)`, or `None` when nothing carries weight.
pub fn weighted_average<I>(lines: I) -> Option<Decimal>
where
    I: IntoIterator<Item = WeightedGrade>,
{
    let mut weighted_sum = Decimal::ZERO;
    let mut coefficient_sum = Decimal::ZERO;

    // Coefficients written by an init script are unbounded.
    for g in lines {
        let coefficient = Decimal::from(g.coefficient);
        weighted_sum = weighted_sum.checked_add(g.value.checked_mul(coefficient)?)?;
        coefficient_sum = coefficient_sum.checked_add(coefficient)?;
    }

    if coefficient_sum <= Decimal::ZERO {
        return None;
    }
    weighted_sum.checked_div(coefficient_sum)
}

/// Weighted average over every grade recorded for the student.
/// A student without grades (or an unknown id) has no average.
pub fn student_average(conn: &Connection, student_id: &str) -> rusqlite::Result<Option<Decimal>> {
    let mut stmt = conn.prepare(
        "SELECT g.value_cents, m.coefficient
         FROM grades g
         JOIN subjects m ON m.id = g.subject_id
         WHERE g.student_id = ?",
    )?;
    let lines = stmt
        .query_map([student_id], |r| {
            Ok(WeightedGrade {
                value: Decimal::new(r.get(0)?, 2),
                coefficient: r.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(weighted_average(lines))
}

/// Two decimals, half away from zero.
pub fn round_2_decimals(x: Decimal) -> Decimal {
    let mut r = x.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    r.rescale(2);
    r
}

pub fn format_average(avg: Option<Decimal>) -> String {
    match avg {
        Some(v) => round_2_decimals(v).to_string(),
        None => NOT_AVAILABLE.to_string(),
    }
}
