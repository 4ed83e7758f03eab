//! Interactive console adapter.
//!
//! A sequential, blocking menu loop over the shared progress service. All
//! model behavior lives in the service; this module only prompts, calls,
//! and prints.

use std::collections::BTreeMap;
use std::io::{self, BufRead, Write};
use std::sync::Arc;

use revise_core::catalog;
use services::{ProgressService, ValidationError};

/// Run the menu loop until the student exits or stdin closes.
pub async fn run(service: Arc<ProgressService>) -> io::Result<()> {
    let stdin = io::stdin();
    let mut input = stdin.lock();

    print_banner();

    if !service.student_info().await.baseline_done {
        baseline_assessment(&service, &mut input).await?;
    }

    loop {
        println!();
        println!("Menu:");
        println!("1. Dashboard");
        println!("2. Personalized study plan");
        println!("3. Adaptive quiz");
        println!("4. Exam question predictor");
        println!("5. Topic explainer (offline/online)");
        println!("6. Reflection journal");
        println!("7. Exit");

        let Some(choice) = prompt(&mut input, "Choose option: ")? else {
            break;
        };

        match choice.as_str() {
            "1" => dashboard(&service).await,
            "2" => study_plan(&service).await,
            "3" => adaptive_quiz(&service, &mut input).await?,
            "4" => exam_predictor(&service).await,
            "5" => explain_topic(&service, &mut input).await?,
            "6" => reflection_journal(&service, &mut input).await?,
            "7" => {
                println!("Goodbye! Keep improving.");
                break;
            }
            _ => println!("Invalid option. Please choose 1-7."),
        }
    }

    Ok(())
}

fn print_banner() {
    println!("========================================");
    println!("        Revision Tracker");
    println!(" Offline-first revision for Grade 9");
    println!("========================================");
    println!();
    println!("Covers Math, Biology, Chemistry, Physics, and Geography.");
    println!("Tracks your topic strengths, predicts retention with a");
    println!("forgetting curve, and focuses your study plan on weak areas.");
}

/// Print a prompt and read one trimmed line. `None` means stdin closed.
fn prompt(input: &mut impl BufRead, label: &str) -> io::Result<Option<String>> {
    print!("{label}");
    io::stdout().flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

async fn baseline_assessment(
    service: &ProgressService,
    input: &mut impl BufRead,
) -> io::Result<()> {
    println!();
    println!("Baseline assessment");

    let mut answers = BTreeMap::new();
    for (_, topics) in catalog::SUBJECT_TOPICS {
        for topic in *topics {
            println!();
            println!("What do you know about {topic}?");
            let Some(answer) = prompt(input, "Your answer: ")? else {
                println!("Baseline assessment cancelled.");
                return Ok(());
            };
            answers.insert((*topic).to_string(), answer);
        }
    }

    match service.submit_baseline(&answers).await {
        Ok(outcome) => println!("\n{}", outcome.message),
        Err(err) => println!("Baseline not saved: {err}"),
    }
    Ok(())
}

async fn dashboard(service: &ProgressService) {
    let view = service.dashboard().await;

    println!();
    println!("Multi-subject dashboard");
    println!(
        "System status: {}",
        if view.online { "ONLINE" } else { "OFFLINE" }
    );

    for topic in &view.topics {
        println!(
            "{:22} | Strength: {} | Retention: {}",
            topic.topic, topic.strength, topic.retention
        );
    }

    println!();
    println!("Overall readiness score: {}%", view.readiness_score);
}

async fn study_plan(service: &ProgressService) {
    println!();
    println!("Personalized study plan");

    match service.study_plan().await {
        Ok(plan) => {
            for entry in plan {
                println!(
                    "- {:20} | Strength: {} | Retention: {} | Priority: {}",
                    entry.topic, entry.strength, entry.retention, entry.priority
                );
            }
        }
        Err(err) => println!("{err}"),
    }
}

async fn adaptive_quiz(service: &ProgressService, input: &mut impl BufRead) -> io::Result<()> {
    let Some(topic) = service.weakest_topic().await else {
        println!("No topics to quiz on. Complete the baseline assessment first.");
        return Ok(());
    };

    println!();
    println!("Adaptive question on: {topic}");
    println!("Explain: {topic}");
    let Some(answer) = prompt(input, "Your answer: ")? else {
        return Ok(());
    };

    match service.submit_quiz(&topic, &answer).await {
        Ok(feedback) => {
            if feedback.correct {
                println!("Correct understanding!");
            } else {
                println!("{}", feedback.explanation);
            }
        }
        Err(err) => println!("{err}"),
    }
    Ok(())
}

async fn exam_predictor(service: &ProgressService) {
    println!();
    println!("Likely exam focus topics");

    match service.exam_prediction().await {
        Ok(predicted) => {
            for topic in predicted {
                println!("- {topic}");
            }
        }
        Err(err) => println!("{err}"),
    }
}

async fn explain_topic(service: &ProgressService, input: &mut impl BufRead) -> io::Result<()> {
    let Some(topic) = prompt(input, "Enter topic: ")? else {
        return Ok(());
    };

    match service.explain(&topic).await {
        Ok(explanation) => {
            println!(
                "{} mode:",
                if explanation.online { "Online" } else { "Offline" }
            );
            println!("{}", explanation.explanation);
        }
        Err(ValidationError::EmptyTopic) => println!("Topic cannot be empty."),
        Err(err) => println!("{err}"),
    }
    Ok(())
}

async fn reflection_journal(
    service: &ProgressService,
    input: &mut impl BufRead,
) -> io::Result<()> {
    println!();
    println!("Reflection journal");
    let Some(entry) = prompt(input, "What was hard today? ")? else {
        return Ok(());
    };

    match service.add_reflection(&entry).await {
        Ok(()) => println!("Reflection saved."),
        Err(ValidationError::EmptyReflection) => {
            println!("Empty entry. Reflection not saved.");
        }
        Err(err) => println!("{err}"),
    }
    Ok(())
}
