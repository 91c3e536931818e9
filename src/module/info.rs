use super::*;

pub fn info_module<B: Backend>(module: &Module<'_, B>) -> String {
    let mut ret = format!("Title: {}\n", module.title());
    ret.push_str(&format!("Tracker: {}\n", module.tracker()));

    // counts

    ret.push_str("\n");
    ret.push_str(&info_counts(module));

    // playback settings

    ret.push_str("\n\n");
    ret.push_str(&format!(
        "Speed: {}, tempo: {}, loop: {}, fadeout: {}\n",
        module.speed(),
        module.tempo(),
        yes_no(module.is_looping()),
        yes_no(module.has_fadeout())
    ));

    // comment

    let comment = module.comment();
    if !comment.trim().is_empty() {
        ret.push_str("\nComment:\n");
        ret.push_str(&info_comment(&comment));
        ret.push_str("\n");
    }

    ret
}

fn info_counts<B: Backend>(module: &Module<'_, B>) -> String {
    let counts = [
        ("channels", module.num_channels()),
        ("voices", module.num_voices()),
        ("positions", module.num_positions()),
        ("patterns", module.num_patterns()),
        ("instruments", module.num_instruments()),
        ("samples", module.num_samples()),
    ];
    let count_strs: Vec<_> = counts
        .iter()
        .map(|(name, count)| format!("{:>12}: {:>3}", name, count))
        .collect();
    count_strs.join("\n")
}

// libmikmod separates comment lines with '\r'
fn info_comment(comment: &str) -> String {
    let lines: Vec<_> = comment
        .split(|c| c == '\r' || c == '\n')
        .map(|line| format!("  {}", line.trim_end()))
        .collect();
    lines.join("\n")
}

fn yes_no(b: bool) -> &'static str {
    if b {
        "yes"
    } else {
        "no"
    }
}
