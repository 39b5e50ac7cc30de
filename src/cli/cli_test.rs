use std::error::Error;

use clap::Parser;

use crate::cli::{Args, Commands};

#[tokio::test]
async fn test_parse_defaults() -> Result<(), Box<dyn Error>> {
    let args = Args::try_parse_from(["hidmap"])?;
    assert!(args.cmd.is_none());
    assert!(args.data_dir.is_none());

    let args = Args::try_parse_from(["hidmap", "collect", "--label", "cross"])?;
    let Some(Commands::Collect {
        label,
        count,
        simulate,
        timeout,
        no_save,
    }) = args.cmd
    else {
        return Err("expected the collect command".into());
    };
    assert_eq!(label, "cross");
    assert_eq!(count, 3);
    assert_eq!(timeout, 8);
    assert!(!simulate);
    assert!(!no_save);

    Ok(())
}

#[tokio::test]
async fn test_parse_global_options() -> Result<(), Box<dyn Error>> {
    let args = Args::try_parse_from([
        "hidmap",
        "calibrate",
        "--simulate",
        "--trials",
        "3",
        "--data-dir",
        "/tmp/hidmap",
    ])?;
    assert_eq!(
        args.data_dir.as_deref(),
        Some(std::path::Path::new("/tmp/hidmap"))
    );
    assert!(matches!(
        args.cmd,
        Some(Commands::Calibrate {
            simulate: true,
            trials: 3,
            ..
        })
    ));

    assert!(Args::try_parse_from(["hidmap", "collect"]).is_err());
    assert!(Args::try_parse_from(["hidmap", "completions", "bash"]).is_ok());

    Ok(())
}

#[cfg(not(feature = "hidraw"))]
#[tokio::test]
async fn test_open_without_hidraw_support() -> Result<(), Box<dyn Error>> {
    use crate::{
        cli::{open_device, open_source},
        config::layout::Layout,
        input::source::InputError,
    };

    let result = open_device(Some("/dev/hidraw0"));
    assert!(matches!(result, Err(InputError::Device(_))));

    // An explicit device path is never replaced by the simulator
    let result = open_source(false, Some("/dev/hidraw0"), &Layout::dualshock());
    assert!(matches!(result, Err(InputError::Device(_))));

    let source = open_source(false, None, &Layout::dualshock())?;
    assert_eq!(source.name(), "simulated controller");

    Ok(())
}
