//! The café floor plan used by table bookings.
//!
//! Four two-seaters sit on the terrace (`O1`-`O4`), eleven tables inside
//! (`I1`-`I11`). The grid coordinates place each table on the booking page.

/// Table shape, used to pick the drawing on the floor plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableShape {
    Square,
    Round,
    Long,
}

impl TableShape {
    /// CSS modifier for the table drawing.
    #[must_use]
    pub const fn css_class(self) -> &'static str {
        match self {
            Self::Square => "table--square",
            Self::Round => "table--round",
            Self::Long => "table--long",
        }
    }
}

/// Where a table stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Zone {
    Outdoor,
    Indoor,
}

/// One bookable table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Table {
    pub id: &'static str,
    pub shape: TableShape,
    pub seats: u8,
    pub zone: Zone,
    /// Grid row on the floor plan (1-based).
    pub row: u8,
    /// Grid column on the floor plan (1-based).
    pub column: u8,
}

const fn table(id: &'static str, shape: TableShape, seats: u8, zone: Zone, row: u8, column: u8) -> Table {
    Table {
        id,
        shape,
        seats,
        zone,
        row,
        column,
    }
}

/// Every table in the café.
pub const TABLES: [Table; 15] = [
    table("O1", TableShape::Square, 2, Zone::Outdoor, 1, 1),
    table("O2", TableShape::Square, 2, Zone::Outdoor, 1, 2),
    table("O3", TableShape::Square, 2, Zone::Outdoor, 1, 4),
    table("O4", TableShape::Square, 2, Zone::Outdoor, 1, 5),
    table("I1", TableShape::Long, 6, Zone::Indoor, 2, 1),
    table("I2", TableShape::Long, 6, Zone::Indoor, 2, 2),
    table("I3", TableShape::Round, 4, Zone::Indoor, 2, 3),
    table("I4", TableShape::Long, 4, Zone::Indoor, 2, 4),
    table("I5", TableShape::Square, 2, Zone::Indoor, 2, 5),
    table("I11", TableShape::Square, 2, Zone::Indoor, 3, 5),
    table("I6", TableShape::Long, 4, Zone::Indoor, 4, 1),
    table("I7", TableShape::Long, 4, Zone::Indoor, 4, 2),
    table("I8", TableShape::Long, 4, Zone::Indoor, 4, 3),
    table("I9", TableShape::Round, 4, Zone::Indoor, 4, 4),
    table("I10", TableShape::Square, 2, Zone::Indoor, 4, 5),
];

/// Look a table up by its id (case-insensitive).
#[must_use]
pub fn find_table(id: &str) -> Option<&'static Table> {
    TABLES.iter().find(|t| t.id.eq_ignore_ascii_case(id.trim()))
}

/// A table together with its booking state for one date and time slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableAvailability {
    pub table: &'static Table,
    pub booked: bool,
    pub selected: bool,
}

/// Combine the floor plan with the ids the API reports as booked.
///
/// `selected` marks the table the customer picked; a booked table is never
/// reported as selected.
#[must_use]
pub fn availability(booked_ids: &[String], selected: Option<&str>) -> Vec<TableAvailability> {
    TABLES
        .iter()
        .map(|table| {
            let booked = booked_ids
                .iter()
                .any(|id| id.trim().eq_ignore_ascii_case(table.id));
            let selected = !booked && selected.is_some_and(|s| s.eq_ignore_ascii_case(table.id));
            TableAvailability {
                table,
                booked,
                selected,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_floor_plan_has_fifteen_unique_tables() {
        let mut ids: Vec<_> = TABLES.iter().map(|t| t.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 15);
        assert_eq!(TABLES.iter().filter(|t| t.zone == Zone::Outdoor).count(), 4);
    }

    #[test]
    fn test_find_table_ignores_case() {
        let table = find_table(" i3 ").map(|t| (t.shape, t.seats));
        assert_eq!(table, Some((TableShape::Round, 4)));
        assert!(find_table("X9").is_none());
    }

    #[test]
    fn test_booked_tables_cannot_be_selected() {
        let booked = vec!["I1".to_string(), "o2".to_string()];
        let plan = availability(&booked, Some("I1"));

        let state = |id: &str| {
            plan.iter()
                .find(|a| a.table.id == id)
                .map(|a| (a.booked, a.selected))
        };
        assert_eq!(state("I1"), Some((true, false)));
        assert_eq!(state("O2"), Some((true, false)));
        assert_eq!(state("I2"), Some((false, false)));

        let plan = availability(&booked, Some("I2"));
        assert!(plan.iter().any(|a| a.table.id == "I2" && a.selected));
    }
}
