// Prompt templates for the resume ranking chains.
// Placeholders are `{name}` and are filled by `llm_client::prompts::render`.

pub const JD_PARSER_ROLE: &str = "You are an expert recruiter analyzing job descriptions.";

pub const JD_PARSER_PROMPT_TEMPLATE: &str = r#"Analyze this job description and extract structured requirements.

Job Description:
{jd_text}

Extract the following information:
1. Role/Job Title
2. Must-have skills (absolutely required)
3. Nice-to-have skills (preferred but optional)
4. Minimum years of experience
5. Maximum years of experience (null if not mentioned)
6. Domain/Industry
7. Tech stack and tools
8. A brief 2-3 sentence summary for semantic matching

Be precise and extract only what is explicitly stated or strongly implied.

Return a JSON object with this exact structure:
{
  "role": "string",
  "must_have_skills": ["string"],
  "nice_to_have_skills": ["string"],
  "min_experience_years": 0,
  "max_experience_years": null,
  "domain": "string",
  "tech_stack": ["string"],
  "summary": "string"
}"#;

pub const RESUME_PARSER_ROLE: &str =
    "You are an expert resume analyst extracting candidate information.";

pub const RESUME_PARSER_PROMPT_TEMPLATE: &str = r#"Extract structured information from this resume.

Resume Text:
{resume_text}

Extract the following:
1. Candidate's full name
2. Email (if visible, otherwise null)
3. All technical and soft skills
4. Total years of professional experience
5. Notable projects (name, brief description, technologies used)
6. Education details (degrees, institutions)
7. Past company names
8. A 2-3 sentence summary highlighting key strengths for job matching

Be thorough but only extract what is explicitly stated or clearly implied.

Return a JSON object with this exact structure:
{
  "name": "string",
  "email": null,
  "skills": ["string"],
  "experience_years": 0,
  "projects": [{"name": "string", "description": "string", "technologies": ["string"]}],
  "education": ["string"],
  "companies": ["string"],
  "summary": "string"
}"#;

pub const EVALUATOR_ROLE: &str =
    "You are a senior hiring manager providing candidate evaluations.";

pub const EVALUATOR_PROMPT_TEMPLATE: &str = r#"Evaluate this candidate against the job description.

## Job Requirements:
Role: {role}
Must-Have Skills: {must_have_skills}
Nice-to-Have Skills: {nice_to_have_skills}
Experience Required: {min_experience}+ years
Domain: {domain}

## Candidate Profile:
Name: {candidate_name}
Skills: {candidate_skills}
Experience: {candidate_experience} years
Projects: {candidate_projects}
Education: {candidate_education}

## Scoring Context:
- Semantic Match Score: {semantic_score}
- Skill Match Score: {skill_score}
- Experience Score: {experience_score}
- Project Relevance: {project_score}
- Aggregate Score: {aggregate_score}

Provide a qualitative evaluation:
1. Key strengths that make this candidate a good fit
2. Potential risks or gaps
3. Skills that are missing but could be learned
4. Brief overall fit summary (2-3 sentences)

Be honest and specific. Do not just repeat the scores.

Return a JSON object with this exact structure:
{
  "strengths": ["string"],
  "risks": ["string"],
  "missing_skills": ["string"],
  "fit_summary": "string"
}"#;

pub const RERANKER_ROLE: &str = "You are a senior recruiter making final hiring decisions.";

pub const RERANKER_PROMPT_TEMPLATE: &str = r#"Make final hiring recommendations.

## Job Requirements:
Role: {role}
Must-Have Skills: {must_have_skills}
Domain: {domain}
Experience: {min_experience}+ years

## Candidates with Scores:
{candidates_summary}

Based on the scores AND your understanding of role fit, provide a final ranking.
Consider:
- Must-have skill coverage is critical
- Domain experience matters for senior roles
- Balance between overqualified and underqualified
- Growth potential for borderline candidates

Rank all candidates from 1 (best fit) to N (least fit), using the exact IDs above.
Provide a brief reason for each ranking position.

Return a JSON object with this exact structure:
{
  "rankings": [{"candidate_id": "string", "rank": 1, "reason": "string"}]
}"#;
