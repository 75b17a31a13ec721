//! CSV export of completed rides and driver positions.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::ecs::DriverStatus;
use crate::telemetry::{DispatchTelemetry, WorldSnapshot};

pub fn write_completed_rides_csv<W: Write>(
    writer: W,
    telemetry: &DispatchTelemetry,
) -> Result<(), csv::Error> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record([
        "rider_id",
        "driver_id",
        "requested_at",
        "assigned_at",
        "picked_up_at",
        "completed_at",
        "time_to_assign",
        "time_to_pickup",
        "ride_duration",
    ])?;

    for record in &telemetry.completed_rides {
        wtr.write_record([
            record.rider_id.to_string(),
            record.driver_id.to_string(),
            record.requested_at.to_string(),
            record.assigned_at.to_string(),
            record.picked_up_at.to_string(),
            record.completed_at.to_string(),
            record.time_to_assign().to_string(),
            record.time_to_pickup().to_string(),
            record.ride_duration().to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_completed_rides_csv_file<P: AsRef<Path>>(
    path: P,
    telemetry: &DispatchTelemetry,
) -> Result<(), csv::Error> {
    let file = File::create(path)?;
    write_completed_rides_csv(file, telemetry)
}

fn status_label(status: DriverStatus) -> &'static str {
    match status {
        DriverStatus::Available => "available",
        DriverStatus::Offered => "offered",
        DriverStatus::Busy => "busy",
    }
}

/// One row per driver: where it is and what it is doing at the snapshot tick.
pub fn write_driver_positions_csv<W: Write>(
    writer: W,
    snapshot: &WorldSnapshot,
) -> Result<(), csv::Error> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(["tick", "driver_id", "x", "y", "status"])?;
    for driver in &snapshot.drivers {
        wtr.write_record([
            snapshot.tick_count.to_string(),
            driver.id.to_string(),
            driver.location.x.to_string(),
            driver.location.y.to_string(),
            status_label(driver.status).to_owned(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::{DriverId, RiderId};
    use crate::spatial::{GridBounds, Location};
    use crate::telemetry::CompletedRideRecord;
    use crate::world::WorldState;

    #[test]
    fn completed_rides_csv_has_header_and_rows() {
        let telemetry = DispatchTelemetry {
            completed_rides: vec![CompletedRideRecord {
                rider_id: RiderId::from("r1"),
                driver_id: DriverId::from("d1"),
                requested_at: 0,
                assigned_at: 1,
                picked_up_at: 4,
                completed_at: 9,
            }],
            ..DispatchTelemetry::default()
        };

        let mut out = Vec::new();
        write_completed_rides_csv(&mut out, &telemetry).expect("write csv");
        let text = String::from_utf8(out).expect("utf8");
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("rider_id,driver_id,requested_at,assigned_at,picked_up_at,completed_at,time_to_assign,time_to_pickup,ride_duration")
        );
        assert_eq!(lines.next(), Some("r1,d1,0,1,4,9,1,3,5"));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn driver_positions_csv_lists_every_driver() {
        let mut state = WorldState::new(GridBounds::default());
        state
            .register_driver(DriverId::from("d1"), Location::new(3, 4))
            .expect("register");
        let snapshot = WorldSnapshot::capture(&state, 12);

        let mut out = Vec::new();
        write_driver_positions_csv(&mut out, &snapshot).expect("write csv");
        let text = String::from_utf8(out).expect("utf8");
        assert_eq!(text, "tick,driver_id,x,y,status\n12,d1,3,4,available\n");
    }
}
