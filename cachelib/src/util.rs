use std::error::Error;
use std::fs;
use std::fs::File;
use std::io::BufReader;
use regex::Regex;
use crate::config::CacheConfig;
use crate::io::{get_reader, TraceReader};

pub const SAMPLE_INPUTS_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/samples/inputs");
pub const SAMPLE_OUTPUTS_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/samples/outputs");
pub const TRACE_FILES_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/samples/traces");

pub struct TestCasePaths {
    pub config: String,
    pub trace: String,
    pub output: String
}

/// Finds every sample case, one per expected output named `output-<trace>-<config>.json`
pub fn get_configs() -> Result<Vec<TestCasePaths>, Box<dyn Error>> {
    let mut out = Vec::new();
    let output_pattern = Regex::new(r"^output-(?P<trace>[0-9a-zA-Z_]+)-(?P<config>[0-9a-zA-Z_]+)\.json$")?;
    let mut file_names = Vec::new();
    for entry in fs::read_dir(SAMPLE_OUTPUTS_PATH)? {
        let file_name = entry?.file_name().into_string().map_err(|e| format!("Can't convert OS string ({e:?}) to standard string"))?;
        if output_pattern.is_match(&file_name) {
            file_names.push(file_name);
        }
    }
    file_names.sort();
    for file_name in file_names {
        // Get components of name
        let tokens = output_pattern.captures(&file_name).ok_or("Couldn't parse the file name".to_string())?;
        let trace_file_path = tokens.name("trace").ok_or("Couldn't get the trace file from the output file name".to_string())?.as_str();
        let config_file_path = tokens.name("config").ok_or("Couldn't get the config file from the output file name".to_string())?.as_str();
        out.push(TestCasePaths {
            config: format!("{SAMPLE_INPUTS_PATH}/{config_file_path}.json"),
            trace: format!("{TRACE_FILES_PATH}/{trace_file_path}.trace"),
            output: format!("{SAMPLE_OUTPUTS_PATH}/{file_name}"),
        })
    }
    Ok(out)
}

pub fn load_config(path: &str) -> Result<CacheConfig, Box<dyn Error>> {
    let config_file = File::open(path).map_err(|e| format!("Couldn't open the config file at path {path}: {e}"))?;
    Ok(serde_json::from_reader(BufReader::new(config_file))?)
}

/// Reads a whole trace into memory
pub fn load_trace(path: &str) -> Result<Vec<u64>, Box<dyn Error>> {
    let trace_file = File::open(path).map_err(|e| format!("Couldn't open the trace file at path {path}: {e}"))?;
    Ok(TraceReader::new(get_reader(trace_file)?).collect::<Result<_, _>>()?)
}
