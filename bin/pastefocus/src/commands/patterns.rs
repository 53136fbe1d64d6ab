use pastefocus_locator::Pipeline;

pub fn run() {
    let patterns = Pipeline::new().patterns();

    println!("Candidate patterns ({}, tried in order)", patterns.len());
    println!("==================");
    for (index, pattern) in patterns.iter().enumerate() {
        println!("{:>3}  {:<11} {}", index, pattern.group.to_string(), pattern);
    }
}
