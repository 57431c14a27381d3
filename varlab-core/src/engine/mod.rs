//! Position simulation — signals plus realizable variance prices in, NAV
//! ledger and trade records out.
//!
//! Fills use the observation strictly after the signal date: the signal is
//! computed on day t's variance, so the earliest realistically tradeable
//! price is the next available observation. A signal on the last
//! observation therefore opens nothing.

pub mod state_machine;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{
    Direction, NavLedger, NavPoint, Position, Signal, SignalAction, VarianceSeries,
};
use state_machine::PositionStateMachine;

/// Simulator configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulatorConfig {
    /// Variance notional per position.
    pub notional: f64,
    /// Starting NAV of the ledger.
    pub nav_seed: f64,
    /// Proportional fee on notional, charged at entry and at exit.
    pub fee_rate: f64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            notional: 1.0,
            nav_seed: 1.0,
            fee_rate: 0.0,
        }
    }
}

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("calendar date {current} does not follow {previous} (dates must strictly increase)")]
    CalendarNotIncreasing {
        previous: NaiveDate,
        current: NaiveDate,
    },
    #[error("observation date {date} is missing from the calendar")]
    ObservationNotInCalendar { date: NaiveDate },
    #[error("{signals} signals for {observations} observations (must be one per observation)")]
    SignalCountMismatch { observations: usize, signals: usize },
    #[error("signal {index} dated {found}, expected observation date {expected}")]
    SignalDateMismatch {
        index: usize,
        expected: NaiveDate,
        found: NaiveDate,
    },
}

/// Output of one simulation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationResult {
    pub ledger: NavLedger,
    /// Closed positions in close order.
    pub trades: Vec<Position>,
    /// Entry signals dropped by the no-pyramiding guard or for lack of a
    /// forward observation.
    pub ignored_entries: usize,
}

/// An action scheduled at signal time, to fill at the next observation.
#[derive(Debug, Clone, Copy)]
enum PendingFill {
    Enter(Direction),
    Exit,
}

/// Simulate one expiry's strategy over the full quote calendar.
///
/// `calendar` is every quote date of the input, a superset of the series
/// dates; calendar dates without an observation carry the last NAV flat.
/// The ledger always has exactly one point per calendar date.
pub fn simulate(
    calendar: &[NaiveDate],
    series: &VarianceSeries,
    signals: &[Signal],
    config: &SimulatorConfig,
) -> Result<SimulationResult, SimulationError> {
    validate_inputs(calendar, series, signals)?;

    let observations = series.observations();
    let n_obs = observations.len();
    let fee = config.fee_rate * config.notional;

    let mut machine = PositionStateMachine::new();
    let mut open: Option<Position> = None;
    let mut pending: Option<PendingFill> = None;

    let mut cash = config.nav_seed;
    let mut realized_total = 0.0;
    let mut unrealized = 0.0;

    let mut ledger = NavLedger::new();
    let mut trades = Vec::new();
    let mut ignored_entries = 0usize;

    let mut obs_idx = 0usize;
    for &date in calendar {
        let has_observation = obs_idx < n_obs && observations[obs_idx].date == date;

        if has_observation {
            let mark = observations[obs_idx].implied_variance;

            // Fill whatever the previous observation's signal scheduled.
            match pending.take() {
                Some(PendingFill::Exit) => {
                    if let Some(mut position) = open.take() {
                        position.close(date, mark);
                        let gross = position.realized_pnl().unwrap_or(0.0);
                        cash += gross - fee;
                        realized_total += gross - fee;
                        machine.try_exit();
                        trades.push(position);
                    }
                }
                Some(PendingFill::Enter(direction)) => {
                    if machine.try_enter(direction) {
                        cash -= fee;
                        realized_total -= fee;
                        open = Some(Position::open(date, direction, mark, config.notional));
                    } else {
                        ignored_entries += 1;
                    }
                }
                None => {}
            }

            // Today's signal schedules a fill at the next observation.
            let is_last = obs_idx + 1 >= n_obs;
            match signals[obs_idx].action {
                action @ (SignalAction::EnterLong | SignalAction::EnterShort) => {
                    let direction = if action == SignalAction::EnterLong {
                        Direction::LongVariance
                    } else {
                        Direction::ShortVariance
                    };
                    if !machine.state().is_flat() || is_last {
                        ignored_entries += 1;
                    } else {
                        pending = Some(PendingFill::Enter(direction));
                    }
                }
                SignalAction::Exit => {
                    if !machine.state().is_flat() && !is_last {
                        pending = Some(PendingFill::Exit);
                    }
                    // An exit on the last observation is covered by the
                    // forced close below.
                }
                SignalAction::Hold => {}
            }

            // No position survives the end of the series.
            if is_last {
                pending = None;
                if let Some(mut position) = open.take() {
                    position.close(date, mark);
                    let gross = position.realized_pnl().unwrap_or(0.0);
                    cash += gross - fee;
                    realized_total += gross - fee;
                    machine.try_exit();
                    trades.push(position);
                }
            }

            unrealized = open.as_ref().map_or(0.0, |p| p.unrealized_pnl(mark));
            obs_idx += 1;
        }
        // Dates without an observation hold the last NAV flat.

        ledger.push(NavPoint {
            date,
            cash,
            unrealized_pnl: unrealized,
            realized_pnl: realized_total,
            nav: cash + unrealized,
        });
    }

    Ok(SimulationResult {
        ledger,
        trades,
        ignored_entries,
    })
}

fn validate_inputs(
    calendar: &[NaiveDate],
    series: &VarianceSeries,
    signals: &[Signal],
) -> Result<(), SimulationError> {
    for pair in calendar.windows(2) {
        if pair[1] <= pair[0] {
            return Err(SimulationError::CalendarNotIncreasing {
                previous: pair[0],
                current: pair[1],
            });
        }
    }

    let observations = series.observations();
    if signals.len() != observations.len() {
        return Err(SimulationError::SignalCountMismatch {
            observations: observations.len(),
            signals: signals.len(),
        });
    }
    for (index, (obs, signal)) in observations.iter().zip(signals).enumerate() {
        if signal.date != obs.date {
            return Err(SimulationError::SignalDateMismatch {
                index,
                expected: obs.date,
                found: signal.date,
            });
        }
    }

    // The calendar and series are both sorted, so subset checking is a
    // single merge pass.
    let mut cal = calendar.iter();
    for obs in observations {
        if !cal.any(|&d| d == obs.date) {
            return Err(SimulationError::ObservationNotInCalendar { date: obs.date });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::VarianceObservation;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2022, 6, d).unwrap()
    }

    fn make_series(days: &[u32], values: &[f64]) -> VarianceSeries {
        let obs = days
            .iter()
            .zip(values)
            .map(|(&d, &v)| VarianceObservation {
                date: day(d),
                expiry: NaiveDate::from_ymd_opt(2022, 12, 30).unwrap(),
                time_to_expiry_years: 0.5,
                implied_variance: v,
                n_options: 20,
            })
            .collect();
        VarianceSeries::from_observations(obs).unwrap()
    }

    fn make_signals(series: &VarianceSeries, actions: &[SignalAction]) -> Vec<Signal> {
        series
            .observations()
            .iter()
            .zip(actions)
            .map(|(obs, &action)| Signal {
                date: obs.date,
                action,
                reference_variance: obs.implied_variance,
                band_state: None,
            })
            .collect()
    }

    use crate::domain::SignalAction::{EnterLong, EnterShort, Exit, Hold};

    #[test]
    fn entry_fills_at_next_observation() {
        let series = make_series(&[1, 2, 3, 4], &[0.04, 0.05, 0.06, 0.07]);
        let signals = make_signals(&series, &[EnterLong, Hold, Hold, Hold]);
        let calendar: Vec<NaiveDate> = series.dates();

        let result =
            simulate(&calendar, &series, &signals, &SimulatorConfig::default()).unwrap();
        assert_eq!(result.trades.len(), 1);
        let trade = &result.trades[0];
        assert_eq!(trade.open_date, day(2));
        assert!((trade.entry_variance_price - 0.05).abs() < 1e-12);
        // Forced close at the terminal observation.
        assert_eq!(trade.close_date, Some(day(4)));
        assert!((trade.exit_variance_price.unwrap() - 0.07).abs() < 1e-12);
        assert!((result.ledger.final_nav().unwrap() - 1.02).abs() < 1e-12);
    }

    #[test]
    fn entry_on_last_observation_opens_nothing() {
        let series = make_series(&[1, 2, 3], &[0.04, 0.05, 0.06]);
        let signals = make_signals(&series, &[Hold, Hold, EnterShort]);
        let calendar = series.dates();

        let result =
            simulate(&calendar, &series, &signals, &SimulatorConfig::default()).unwrap();
        assert!(result.trades.is_empty());
        assert_eq!(result.ignored_entries, 1);
        assert!((result.ledger.final_nav().unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn second_entry_while_open_is_ignored() {
        let series = make_series(&[1, 2, 3, 4, 5], &[0.04, 0.05, 0.06, 0.05, 0.04]);
        let signals = make_signals(&series, &[EnterLong, EnterShort, EnterLong, Hold, Hold]);
        let calendar = series.dates();

        let result =
            simulate(&calendar, &series, &signals, &SimulatorConfig::default()).unwrap();
        // One position only, opened from the first entry.
        assert_eq!(result.trades.len(), 1);
        assert_eq!(result.trades[0].direction, Direction::LongVariance);
        assert_eq!(result.ignored_entries, 2);
    }

    #[test]
    fn exit_signal_fills_next_day_and_books_realized() {
        let series = make_series(&[1, 2, 3, 4, 5], &[0.05, 0.06, 0.05, 0.04, 0.04]);
        let signals = make_signals(&series, &[EnterShort, Hold, Exit, Hold, Hold]);
        let calendar = series.dates();

        let result =
            simulate(&calendar, &series, &signals, &SimulatorConfig::default()).unwrap();
        assert_eq!(result.trades.len(), 1);
        let trade = &result.trades[0];
        // Entry at day 2 (0.06), exit fills day 4 (0.04): short gains 0.02.
        assert_eq!(trade.open_date, day(2));
        assert_eq!(trade.close_date, Some(day(4)));
        assert!((trade.realized_pnl().unwrap() - 0.02).abs() < 1e-12);
        assert!((result.ledger.final_nav().unwrap() - 1.02).abs() < 1e-12);
    }

    #[test]
    fn ledger_has_one_point_per_calendar_date() {
        let series = make_series(&[1, 2, 6, 7], &[0.04, 0.05, 0.06, 0.05]);
        let signals = make_signals(&series, &[Hold, Hold, Hold, Hold]);
        // Calendar includes dates 3 and 4 with no observation.
        let calendar = vec![day(1), day(2), day(3), day(4), day(6), day(7)];

        let result =
            simulate(&calendar, &series, &signals, &SimulatorConfig::default()).unwrap();
        assert_eq!(result.ledger.len(), calendar.len());
        let curve = result.ledger.nav_curve();
        assert!(curve.iter().all(|v| v.is_finite()));
        // Flat carry across the gap.
        assert_eq!(curve[1], curve[2]);
        assert_eq!(curve[2], curve[3]);
    }

    #[test]
    fn gap_dates_carry_open_marks_flat() {
        let series = make_series(&[1, 2, 5, 6], &[0.04, 0.05, 0.07, 0.06]);
        let signals = make_signals(&series, &[EnterLong, Hold, Hold, Hold]);
        let calendar = vec![day(1), day(2), day(3), day(5), day(6)];

        let result =
            simulate(&calendar, &series, &signals, &SimulatorConfig::default()).unwrap();
        let points = result.ledger.points();
        // Open at day 2 mark 0.05. Day 3 has no observation: NAV flat.
        assert_eq!(points[1].nav, points[2].nav);
        // Day 5 marks to 0.07: +0.02 unrealized.
        assert!((points[3].unrealized_pnl - 0.02).abs() < 1e-12);
    }

    #[test]
    fn fee_reduces_realized_pnl_on_both_sides() {
        let series = make_series(&[1, 2, 3, 4], &[0.04, 0.05, 0.06, 0.07]);
        let signals = make_signals(&series, &[EnterLong, Hold, Hold, Hold]);
        let calendar = series.dates();
        let config = SimulatorConfig {
            fee_rate: 0.005,
            ..SimulatorConfig::default()
        };

        let result = simulate(&calendar, &series, &signals, &config).unwrap();
        // Gross +0.02, minus two fee legs of 0.005 each.
        let expected = 1.0 + 0.02 - 2.0 * 0.005;
        assert!((result.ledger.final_nav().unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn first_nav_point_is_the_seed() {
        let series = make_series(&[1, 2, 3], &[0.04, 0.05, 0.06]);
        let signals = make_signals(&series, &[EnterLong, Hold, Hold]);
        let calendar = series.dates();
        let config = SimulatorConfig {
            nav_seed: 100.0,
            ..SimulatorConfig::default()
        };

        let result = simulate(&calendar, &series, &signals, &config).unwrap();
        assert_eq!(result.ledger.points()[0].nav, 100.0);
    }

    #[test]
    fn out_of_order_calendar_is_fatal() {
        let series = make_series(&[1, 2], &[0.04, 0.05]);
        let signals = make_signals(&series, &[Hold, Hold]);
        let calendar = vec![day(2), day(1)];

        let result = simulate(&calendar, &series, &signals, &SimulatorConfig::default());
        assert!(matches!(
            result,
            Err(SimulationError::CalendarNotIncreasing { .. })
        ));
    }

    #[test]
    fn signal_count_mismatch_is_fatal() {
        let series = make_series(&[1, 2], &[0.04, 0.05]);
        let signals = make_signals(&series, &[Hold, Hold]);
        let calendar = series.dates();

        let result = simulate(&calendar, &series, &signals[..1], &SimulatorConfig::default());
        assert!(matches!(
            result,
            Err(SimulationError::SignalCountMismatch { .. })
        ));
    }

    #[test]
    fn observation_missing_from_calendar_is_fatal() {
        let series = make_series(&[1, 3], &[0.04, 0.05]);
        let signals = make_signals(&series, &[Hold, Hold]);
        let calendar = vec![day(1), day(2)];

        let result = simulate(&calendar, &series, &signals, &SimulatorConfig::default());
        assert!(matches!(
            result,
            Err(SimulationError::ObservationNotInCalendar { .. })
        ));
    }
}
