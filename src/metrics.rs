use edistribucion_rs::model::{Api, Cups, LoggedInApi, MeterInfo};
use edistribucion_rs::Error;
use prometheus::{Encoder, GaugeVec, TextEncoder};

lazy_static! {
    static ref CURRENT_POWER_GAUGE: GaugeVec = register_gauge_vec!(
        opts!("meter_current_power", "instantaneous power read from the meter (in kW)",),
        &["cups_id", "cups_name"],
    )
    .unwrap();
    static ref CONTRACTED_POWER_GAUGE: GaugeVec = register_gauge_vec!(
        opts!("meter_contracted_power", "contracted power of the supply point (in kW)",),
        &["cups_id", "cups_name"],
    )
    .unwrap();
    static ref PERCENTAGE_GAUGE: GaugeVec = register_gauge_vec!(
        opts!(
            "meter_power_percentage",
            "current power as percentage of contracted power",
        ),
        &["cups_id", "cups_name"],
    )
    .unwrap();
    static ref ICP_STATE_GAUGE: GaugeVec = register_gauge_vec!(
        opts!("meter_icp_state", "state of the ICP breaker, as label",),
        &["cups_id", "cups_name", "state"],
    )
    .unwrap();
}

/// Feed one meter reading of `cups` to Prometheus metrics.
fn process_meter_info(cups: &Cups, meter: &MeterInfo) {
    let labels = [cups.id.as_str(), cups.name.as_str()];

    CURRENT_POWER_GAUGE
        .with_label_values(&labels)
        .set(meter.current_power);
    CONTRACTED_POWER_GAUGE
        .with_label_values(&labels)
        .set(meter.contracted_power);

    if let Some(percentage) = meter.percentage_value() {
        PERCENTAGE_GAUGE.with_label_values(&labels).set(percentage);
    } else {
        log::warn!(
            "Unparseable percentage {:?} for CUPS {}",
            meter.percentage,
            cups.name
        );
    }

    ICP_STATE_GAUGE
        .with_label_values(&[cups.id.as_str(), cups.name.as_str(), meter.icp_state.as_str()])
        .set(1.0);
}

/// Read every CUPS of the account. A reading the portal refuses is logged and skipped.
pub async fn readings(api: &LoggedInApi) -> Result<Vec<(Cups, Result<MeterInfo, Error>)>, Error> {
    let cups = edistribucion_rs::list_cups(api).await?;
    let mut readings = Vec::with_capacity(cups.len());

    for cups in cups {
        let meter = edistribucion_rs::meter_info(api, &cups.id).await;
        if let Err(e) = &meter {
            log::warn!(
                "Skipping CUPS {} ({}): {}",
                cups.name,
                cups.provisioning_address,
                e
            );
        }
        readings.push((cups, meter));
    }

    Ok(readings)
}

/// Replace exported series with `readings`. A CUPS whose reading failed loses all its series
/// until it reads again.
fn process_readings(readings: &[(Cups, Result<MeterInfo, Error>)]) {
    CURRENT_POWER_GAUGE.reset();
    CONTRACTED_POWER_GAUGE.reset();
    PERCENTAGE_GAUGE.reset();
    ICP_STATE_GAUGE.reset();

    for (cups, meter) in readings {
        if let Ok(meter) = meter {
            process_meter_info(cups, meter);
        }
    }
}

/// Collect all supported metrics from `api`, updating Prometheus exporter registry.
pub async fn collect(api: &Api) -> Result<(), Error> {
    let logged_in_api = edistribucion_rs::login(api).await?;
    let readings = readings(&logged_in_api).await?;

    process_readings(&readings);
    Ok(())
}

/// Read metrics from Prometheus exporter registry.
pub async fn read() -> Result<String, Error> {
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| Error::Internal(format!("Unable to encode metrics: {}", e)))?;
    String::from_utf8(buffer).map_err(|e| Error::Internal(e.to_string()))
}
