//! Tabular export of a transport request.
//!
//! Produces the CSV handed to the recipient: one header/data pair for the
//! order fields, a separating blank row, then a `VIN,Make,Model` section
//! with one row per vehicle.

use crate::NotifyError;
use trq_types::Order;

/// Renders an order as CSV bytes.
pub fn order_to_csv(order: &Order) -> Result<Vec<u8>, NotifyError> {
	let mut writer = csv::WriterBuilder::new()
		.flexible(true)
		.from_writer(Vec::new());

	writer
		.write_record([
			"Request Number",
			"Company Name",
			"Pickup Location",
			"Pickup Contact Name",
			"Pickup Contact Phone",
			"Delivery Location",
			"Delivery Contact Name",
			"Delivery Contact Phone",
		])
		.map_err(|e| NotifyError::Export(e.to_string()))?;
	writer
		.write_record([
			order.request_number.as_str(),
			order.company_name.as_str(),
			order.pickup.location.as_str(),
			order.pickup.contact.name.as_str(),
			order.pickup.contact.phone.as_str(),
			order.delivery.location.as_str(),
			order.delivery.contact.name.as_str(),
			order.delivery.contact.phone.as_str(),
		])
		.map_err(|e| NotifyError::Export(e.to_string()))?;

	writer
		.write_record([""])
		.map_err(|e| NotifyError::Export(e.to_string()))?;
	writer
		.write_record(["VIN", "Make", "Model"])
		.map_err(|e| NotifyError::Export(e.to_string()))?;
	for vehicle in &order.vehicles {
		writer
			.write_record([
				vehicle.vin.as_str(),
				vehicle.make.as_str(),
				vehicle.model.as_str(),
			])
			.map_err(|e| NotifyError::Export(e.to_string()))?;
	}

	writer
		.into_inner()
		.map_err(|e| NotifyError::Export(e.to_string()))
}

/// Attachment filename for an exported order.
pub fn export_filename(order: &Order) -> String {
	format!("TransportRequest_{}.csv", order.request_number)
}
