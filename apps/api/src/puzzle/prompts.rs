// Prompt templates for the puzzle stages.
// Placeholders are `{name}`; see `llm_client::prompts::render`.

pub const CLASSIFIER_ROLE: &str = "You are an expert in logic puzzles. You classify puzzles precisely.";

pub const CLASSIFIER_PROMPT_TEMPLATE: &str = r#"Classify the following logic puzzle.

Return a JSON object with this EXACT schema:
{
  "puzzle_type": "constraint_satisfaction",
  "difficulty": "medium"
}

PUZZLE TYPES: "constraint_satisfaction", "deduction", "arithmetic", "sequence", "truth_teller", "spatial", "other".
DIFFICULTY: "easy", "medium", "hard".

FEEDBACK FROM A PREVIOUS ATTEMPT (address it if not "None"):
{feedback}

PUZZLE:
{puzzle}"#;

pub const STRATEGY_ROLE: &str = "You are an expert puzzle strategist. You choose the most reliable solving method.";

pub const STRATEGY_PROMPT_TEMPLATE: &str = r#"Select a solving strategy for this puzzle.

Puzzle type: {puzzle_type}
Difficulty: {difficulty}

Return a JSON object with this EXACT schema:
{
  "strategy": "Build a 5x5 grid of attributes and eliminate options clue by clue."
}

The strategy must be concrete enough for another solver to follow step by step.

FEEDBACK FROM A PREVIOUS ATTEMPT (address it if not "None"):
{feedback}

PUZZLE:
{puzzle}"#;

pub const SOLVER_ROLE: &str = "You are a meticulous logic puzzle solver. You follow the given strategy exactly.";

pub const SOLVER_PROMPT_TEMPLATE: &str = r#"Solve the puzzle using the strategy below.

STRATEGY:
{strategy}

Return a JSON object with this EXACT schema:
{
  "answer": "The German owns the fish.",
  "constraints": [
    "Clue 8: the Norwegian lives in house 1",
    "Clue 10: house 2 is blue"
  ]
}

List every constraint you relied on, in the order you applied it.

FEEDBACK FROM A PREVIOUS ATTEMPT (fix the issue if not "None"):
{feedback}

PUZZLE:
{puzzle}"#;

pub const VERIFIER_ROLE: &str = "You are a strict verifier of logic puzzle solutions.";

pub const VERIFIER_PROMPT_TEMPLATE: &str = r#"Verify the proposed solution against EVERY clue of the puzzle.

Classification: {puzzle_type} ({difficulty})
Strategy: {strategy}
Proposed answer: {answer}
Constraints applied:
{constraints}

Previous feedback: {previous_feedback}

Return a JSON object with this EXACT schema:
{
  "is_valid": false,
  "issue_source": "solver",
  "issue_details": "Clue 4 is violated: green is not immediately left of white.",
  "suggestion": "Re-place the green and white houses before assigning drinks.",
  "verification_summary": "Checked 12 clues; clue 4 fails."
}

ISSUE SOURCE (only when is_valid is false; otherwise null):
- "classifier": the puzzle was misclassified, leading to an unsuitable approach
- "strategy": the chosen strategy cannot reach a correct answer
- "solver": the strategy was fine but it was applied incorrectly

PUZZLE:
{puzzle}"#;

pub const EXPLAINER_ROLE: &str = "You explain logic puzzle solutions clearly to a general audience.";

pub const EXPLAINER_PROMPT_TEMPLATE: &str = r#"Build the final explanation of this solution.

Answer: {answer}
Constraints applied:
{constraints}
Verification: {verification_summary}

Return a JSON object with this EXACT schema:
{
  "final_answer": "The German owns the fish.",
  "assumptions": ["Houses are numbered 1 to 5 from left to right"],
  "deductions": ["From clue 8 the Norwegian is in house 1", "..."],
  "verification": "All 12 clues hold for the final arrangement."
}

PUZZLE:
{puzzle}"#;
