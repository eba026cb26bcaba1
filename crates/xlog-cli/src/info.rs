use miette::IntoDiagnostic;
use tracing::info;
use xlog::XlogReader;

use crate::args::InfoArgs;

pub(crate) fn info(args: InfoArgs) -> miette::Result<()> {
	info!("opening reader");
	let reader = XlogReader::open(&args.input).into_diagnostic()?;
	println!("format: {}", reader.version());

	let mut count = 0usize;
	for record in reader {
		record.into_diagnostic()?;
		count += 1;
	}

	println!("records: {count}");
	Ok(())
}
