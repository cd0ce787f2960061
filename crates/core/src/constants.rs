/// Pseudo account id used for positions aggregated across every account
pub const PORTFOLIO_TOTAL_ACCOUNT_ID: &str = "TOTAL";

/// Fractional digits carried by fixed-point values
pub const DECIMAL_PRECISION: u32 = 6;

/// Micro-units per whole unit
pub const MICROS_PER_UNIT: i64 = 1_000_000;

/// Decimal precision for display
pub const DISPLAY_DECIMAL_PRECISION: u32 = 2;

/// Default reporting currency
pub const DEFAULT_REPORTING_CURRENCY: &str = "USD";

/// Holding period, in whole days, at which a lot becomes long-term
pub const LONG_TERM_THRESHOLD_DAYS: i64 = 365;

/// Bonds are quoted as a percentage of face value
pub const PERCENT_OF_FACE_DIVISOR: i64 = 100;
