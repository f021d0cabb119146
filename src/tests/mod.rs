mod test_data;

mod test_covariance;
mod test_room;

use crate::affinity::Bandwidth;

pub const BANDWIDTH: Bandwidth = Bandwidth::MedianScale(1.0);
